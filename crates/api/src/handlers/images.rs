//! Handler for binary image retrieval.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use leukoscan_core::error::CoreError;
use leukoscan_core::roles::ROLE_ADMIN;
use leukoscan_core::types::DbId;
use leukoscan_db::repositories::PredictionImageRepo;
use leukoscan_storage::StoredRef;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Which payload of a prediction image to serve.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    Original,
    Annotated,
}

/// Query parameters for `GET /images/{id}`.
#[derive(Debug, Deserialize)]
pub struct ImageParams {
    #[serde(default)]
    pub kind: ImageKind,
}

/// GET /api/v1/images/{id}?kind=original|annotated
///
/// Binary payload with `Content-Type` from the stored mime type and a
/// long-lived cache header (image payloads are immutable once written).
/// Visible to the owning user and admins only.
pub async fn get(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<ImageParams>,
) -> AppResult<impl IntoResponse> {
    // Retry-wrapped read: a transient outage degrades to "not found".
    let image = state
        .db
        .run(|pool| async move { PredictionImageRepo::find_by_id(&pool, id).await })
        .await?
        .flatten()
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PredictionImage",
            id,
        }))?;

    let pool = state.db.pool().await;
    let owner = PredictionImageRepo::owner_of(&pool, id).await?;
    if owner != Some(auth_user.user_id) && auth_user.role != ROLE_ADMIN {
        // Hide existence from non-owners.
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PredictionImage",
            id,
        }));
    }

    let stored = match params.kind {
        ImageKind::Original => StoredRef::new(
            image.original_image.as_deref(),
            image.original_key.as_deref(),
        ),
        ImageKind::Annotated => StoredRef::new(
            image.annotated_image.as_deref(),
            image.annotated_key.as_deref(),
        ),
    };

    // A record with neither payload shape is "no data" to readers.
    if stored.is_empty() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PredictionImage",
            id,
        }));
    }

    let bytes = state.store.fetch(stored).await?;

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
