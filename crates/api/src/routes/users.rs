//! Route definitions for the `/users` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Request body ceiling for avatar uploads: one image plus form overhead.
const AVATAR_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /me           -> me
/// PATCH  /me           -> update_profile
/// DELETE /me           -> delete_account
/// PUT    /me/password  -> change_password
/// POST   /me/avatar    -> upload_avatar (multipart)
/// GET    /{id}/avatar  -> get_avatar
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(users::me)
                .patch(users::update_profile)
                .delete(users::delete_account),
        )
        .route("/me/password", put(users::change_password))
        .route(
            "/me/avatar",
            post(users::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/{id}/avatar", get(users::get_avatar))
}
