//! Image-storage strategy.
//!
//! The platform persists image payloads in exactly one of two places,
//! chosen at deployment time: inline in the owning database row
//! ([`InlineStore`]) or in an S3-compatible bucket ([`S3Store`]). Handlers
//! talk to the [`ImageStore`] trait only; the row schema carries both an
//! inline column and a key column, and whichever the active backend
//! returns is the one that gets populated.

use std::sync::Arc;

use async_trait::async_trait;

pub mod inline;
pub mod s3;

pub use inline::InlineStore;
pub use s3::S3Store;

/// Error type for storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object-store request failed (network, auth, missing object).
    #[error("Object store request failed: {0}")]
    Backend(String),

    /// The row carries no payload the active backend can resolve.
    #[error("No stored payload")]
    Missing,

    /// The deployment configuration is unusable.
    #[error("Storage configuration error: {0}")]
    Config(String),
}

/// Where a freshly stored payload ended up.
///
/// [`BlobPayload::into_parts`] splits this into the `(inline bytes, object
/// key)` column pair the repositories persist.
#[derive(Debug, Clone)]
pub enum BlobPayload {
    /// Bytes to be written into the row itself.
    Inline(Vec<u8>),
    /// Key of the object now living in the external store.
    Key(String),
}

impl BlobPayload {
    /// Split into the `(inline, key)` column pair.
    pub fn into_parts(self) -> (Option<Vec<u8>>, Option<String>) {
        match self {
            BlobPayload::Inline(bytes) => (Some(bytes), None),
            BlobPayload::Key(key) => (None, Some(key)),
        }
    }
}

/// A stored payload as read back from a row.
#[derive(Debug, Clone, Copy)]
pub struct StoredRef<'a> {
    pub inline: Option<&'a [u8]>,
    pub key: Option<&'a str>,
}

impl<'a> StoredRef<'a> {
    pub fn new(inline: Option<&'a [u8]>, key: Option<&'a str>) -> Self {
        Self { inline, key }
    }

    /// True when neither shape is present -- "no data" to readers.
    pub fn is_empty(&self) -> bool {
        self.inline.is_none() && self.key.is_none()
    }
}

/// The single image-storage strategy interface.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `key`, returning the shape to record on the row.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobPayload, StorageError>;

    /// Resolve a stored payload back to bytes.
    async fn fetch(&self, stored: StoredRef<'_>) -> Result<Vec<u8>, StorageError>;

    /// Remove an externally stored object. A `None` key is a no-op (the
    /// payload lived inline and dies with its row).
    async fn delete(&self, key: Option<&str>) -> Result<(), StorageError>;

    /// Backend name for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}

/// Build a unique object key for an upload.
///
/// Shape: `<prefix>/<uuid>_<sanitized filename>`. The UUID guarantees
/// uniqueness; the filename tail keeps bucket listings readable.
pub fn object_key(prefix: &str, filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}/{}_{safe}", uuid::Uuid::new_v4())
}

/// Construct the deployment's storage backend from the environment.
///
/// | Env Var           | Values            | Default  |
/// |-------------------|-------------------|----------|
/// | `STORAGE_BACKEND` | `inline` \| `s3`  | `inline` |
/// | `S3_BUCKET`       | bucket name       | required when backend is `s3` |
pub async fn from_env() -> Result<Arc<dyn ImageStore>, StorageError> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "inline".into());
    match backend.as_str() {
        "inline" => Ok(Arc::new(InlineStore::new())),
        "s3" => {
            let bucket = std::env::var("S3_BUCKET")
                .map_err(|_| StorageError::Config("S3_BUCKET must be set for the s3 backend".into()))?;
            Ok(Arc::new(S3Store::from_env(bucket).await))
        }
        other => Err(StorageError::Config(format!(
            "Unknown STORAGE_BACKEND '{other}' (expected 'inline' or 's3')"
        ))),
    }
}
