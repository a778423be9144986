pub mod admin;
pub mod auth;
pub mod health;
pub mod images;
pub mod inference;
pub mod predictions;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 register (public)
/// /auth/login                    login (public)
/// /auth/refresh                  refresh (public)
/// /auth/logout                   logout (requires auth)
/// /auth/session-policy           session policy constants (public)
///
/// /users/me                      get, patch, delete own account
/// /users/me/password             change password (PUT)
/// /users/me/avatar               upload avatar (POST multipart)
/// /users/{id}/avatar             avatar binary (GET)
///
/// /predictions                   ingest (POST multipart), list (GET)
/// /predictions/{id}              get, patch, delete
///
/// /images/{id}                   image binary (GET, ?kind=)
///
/// /inference/detect              forward one image to the detector (POST)
///
/// /admin/users                   paginated user listing (admin only)
/// /admin/users/{id}              deactivate account (admin only)
/// /admin/stats                   aggregate counts (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/predictions", predictions::router())
        .nest("/images", images::router())
        .nest("/inference", inference::router())
        .nest("/admin", admin::router())
}
