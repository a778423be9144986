//! Route definitions for the `/inference` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::inference;
use crate::state::AppState;

/// Request body ceiling: one image plus form overhead.
const DETECT_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Routes mounted at `/inference`.
///
/// ```text
/// POST /detect  -> detect (multipart, forwards to the detection service)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/detect", post(inference::detect))
        .layer(DefaultBodyLimit::max(DETECT_BODY_LIMIT))
}
