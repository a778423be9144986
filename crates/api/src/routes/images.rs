//! Route definitions for the `/images` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// GET /{id}  -> get (binary body, ?kind=original|annotated)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(images::get))
}
