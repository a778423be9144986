//! Route definitions for the `/predictions` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::predictions;
use crate::state::AppState;

/// Request body ceiling for an ingest submission. Individual files are
/// bounded separately (5 MB each, enforced in the handler); this caps the
/// whole multipart body.
const INGEST_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Routes mounted at `/predictions`.
///
/// ```text
/// POST   /       -> ingest (multipart)
/// GET    /       -> list (paginated)
/// GET    /{id}   -> get
/// PATCH  /{id}   -> update (owner only)
/// DELETE /{id}   -> delete (owner only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(predictions::ingest).get(predictions::list))
        .route(
            "/{id}",
            get(predictions::get)
                .patch(predictions::update)
                .delete(predictions::delete),
        )
        .layer(DefaultBodyLimit::max(INGEST_BODY_LIMIT))
}
