//! Handlers for the `/admin` resource. All require the `admin` role.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use leukoscan_core::error::CoreError;
use leukoscan_core::types::DbId;
use leukoscan_db::models::user::UserResponse;
use leukoscan_db::repositories::{PredictionImageRepo, PredictionLogRepo, SessionRepo, UserRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PageParams;
use crate::response::{DataResponse, Paginated};
use crate::state::AppState;

/// Aggregate platform counts for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct PlatformStats {
    #[serde(rename = "totalUsers")]
    pub total_users: i64,
    #[serde(rename = "totalPredictions")]
    pub total_predictions: i64,
    #[serde(rename = "totalImages")]
    pub total_images: i64,
    #[serde(rename = "predictionsLast24h")]
    pub predictions_last_24h: i64,
}

/// GET /api/v1/admin/users?page=&limit=
///
/// Paginated user listing, newest first. A transient database outage
/// degrades to an empty page rather than an error.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let (page, limit, offset) = params.resolve();

    let result = state
        .db
        .run(|pool| async move {
            let users = UserRepo::list_page(&pool, limit, offset).await?;
            let total = UserRepo::count_all(&pool).await?;
            Ok((users, total))
        })
        .await?;

    let (users, total) = result.unwrap_or((Vec::new(), 0));
    let items = users.into_iter().map(|u| u.into_response()).collect();

    Ok(Json(Paginated::new(items, page, limit, total)))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Soft-deactivate an account and revoke its sessions. The user's data
/// stays; they can no longer sign in.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "Admins cannot deactivate their own account".into(),
        )));
    }

    let pool = state.db.pool().await;
    let deactivated = UserRepo::deactivate(&pool, id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    SessionRepo::revoke_all_for_user(&pool, id).await?;

    tracing::info!(admin_id = admin.user_id, user_id = id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/stats
///
/// Aggregate counts. Degrades to all-zero counts on a transient outage.
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<PlatformStats>>> {
    let result = state
        .db
        .run(|pool| async move {
            let total_users = UserRepo::count_all(&pool).await?;
            let total_predictions = PredictionLogRepo::count_all(&pool).await?;
            let total_images = PredictionImageRepo::count_all(&pool).await?;
            let predictions_last_24h = PredictionLogRepo::count_recent(&pool, 24).await?;
            Ok(PlatformStats {
                total_users,
                total_predictions,
                total_images,
                predictions_last_24h,
            })
        })
        .await?;

    let stats = result.unwrap_or(PlatformStats {
        total_users: 0,
        total_predictions: 0,
        total_images: 0,
        predictions_last_24h: 0,
    });

    Ok(Json(DataResponse { data: stats }))
}
