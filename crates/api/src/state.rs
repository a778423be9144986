use std::sync::Arc;

use leukoscan_inference::InferenceClient;
use leukoscan_storage::ImageStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// Everything long-lived the handlers touch -- the pool handle, the storage
/// backend, the inference client -- is injected here once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (pool + retry policy).
    pub db: leukoscan_db::Db,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The deployment's image-storage backend.
    pub store: Arc<dyn ImageStore>,
    /// Client for the external detection service.
    pub inference: Arc<InferenceClient>,
}
