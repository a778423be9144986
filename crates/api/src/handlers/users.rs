//! Handlers for the authenticated user's own account (`/users/me`) and
//! avatar retrieval.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use leukoscan_core::detection::MAX_IMAGE_BYTES;
use leukoscan_core::error::CoreError;
use leukoscan_core::types::DbId;
use leukoscan_db::models::user::{UpdateUser, UserResponse};
use leukoscan_db::models::user_image::CreateUserImage;
use leukoscan_db::repositories::{SessionRepo, UserImageRepo, UserRepo};
use leukoscan_storage::{object_key, StoredRef};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PATCH /users/me`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
}

/// Request body for `PUT /users/me/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response for a stored avatar upload.
#[derive(Debug, Serialize)]
pub struct AvatarUploaded {
    pub id: DbId,
    pub filename: String,
    pub mime_type: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let pool = state.db.pool().await;
    let user = UserRepo::find_by_id(&pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;

    Ok(Json(DataResponse {
        data: user.into_response(),
    }))
}

/// PATCH /api/v1/users/me
///
/// Update name and/or email. A taken email surfaces as 409.
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let pool = state.db.pool().await;
    let updated = UserRepo::update(
        &pool,
        auth_user.user_id,
        &UpdateUser {
            email: input.email,
            name: input.name,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: auth_user.user_id,
    }))?;

    Ok(Json(DataResponse {
        data: updated.into_response(),
    }))
}

/// PUT /api/v1/users/me/password
///
/// Rehash and store a new password after verifying the current one.
/// All sessions are revoked; the caller must sign in again.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let pool = state.db.pool().await;
    let user = UserRepo::find_by_id(&pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&pool, user.id, &new_hash).await?;
    SessionRepo::revoke_all_for_user(&pool, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/me
///
/// The explicit account-delete flow. Logs, images, and sessions cascade.
pub async fn delete_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<StatusCode> {
    let pool = state.db.pool().await;
    let deleted = UserRepo::delete(&pool, auth_user.user_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }));
    }
    tracing::info!(user_id = auth_user.user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/me/avatar
///
/// Multipart upload of a single image. Replaces the previous profile image
/// (delete-then-insert in one transaction), so invoking this twice still
/// leaves exactly one `is_profile` row.
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AvatarUploaded>>)> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("avatar").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((filename, mime_type, bytes.to_vec()));
    }

    let (filename, mime_type, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    // A lone oversized file rejects the request; there is no batch to fall
    // back to here.
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Avatar exceeds the {} byte limit",
            MAX_IMAGE_BYTES
        ))));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Empty file".to_string()));
    }

    let key = object_key("avatars", &filename);
    let payload = state.store.put(&key, bytes, &mime_type).await?;
    let (image_data, storage_key) = payload.into_parts();

    let pool = state.db.pool().await;

    // The outgoing avatar's bucket object must go too; its row is removed
    // by the replace below.
    let previous = UserImageRepo::find_profile(&pool, auth_user.user_id).await?;

    let image = UserImageRepo::replace_profile(
        &pool,
        &CreateUserImage {
            user_id: auth_user.user_id,
            image_data,
            storage_key,
            mime_type: mime_type.clone(),
            filename: filename.clone(),
            is_profile: true,
        },
    )
    .await?;

    if let Some(previous) = previous {
        if let Err(e) = state.store.delete(previous.storage_key.as_deref()).await {
            tracing::warn!(user_id = auth_user.user_id, error = %e, "Failed to delete previous avatar object");
        }
    }

    tracing::info!(user_id = auth_user.user_id, image_id = image.id, "Avatar replaced");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AvatarUploaded {
                id: image.id,
                filename,
                mime_type,
            },
        }),
    ))
}

/// GET /api/v1/users/{id}/avatar
///
/// Binary avatar payload with a long-lived cache header.
pub async fn get_avatar(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Retry-wrapped read: a transient outage degrades to "not found" rather
    // than failing the request hard.
    let image = state
        .db
        .run(|pool| async move { UserImageRepo::find_profile(&pool, user_id).await })
        .await?
        .flatten()
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UserImage",
            id: user_id,
        }))?;

    let bytes = state
        .store
        .fetch(StoredRef::new(
            image.image_data.as_deref(),
            image.storage_key.as_deref(),
        ))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        bytes,
    ))
}
