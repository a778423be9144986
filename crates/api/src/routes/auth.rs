//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register        -> register (public)
/// POST /login           -> login (public)
/// POST /refresh         -> refresh (public)
/// POST /logout          -> logout (requires auth)
/// GET  /session-policy  -> session_policy (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/session-policy", get(auth::session_policy))
}
