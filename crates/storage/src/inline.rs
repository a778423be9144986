//! Inline storage backend: payloads live in the owning database row.

use async_trait::async_trait;

use crate::{BlobPayload, ImageStore, StorageError, StoredRef};

/// Keeps image bytes in the row's BYTEA column. `put` is a pass-through and
/// `delete` is a no-op because the payload's lifetime is the row's.
#[derive(Debug, Default)]
pub struct InlineStore;

impl InlineStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageStore for InlineStore {
    async fn put(
        &self,
        _key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<BlobPayload, StorageError> {
        Ok(BlobPayload::Inline(bytes))
    }

    async fn fetch(&self, stored: StoredRef<'_>) -> Result<Vec<u8>, StorageError> {
        match stored.inline {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(StorageError::Missing),
        }
    }

    async fn delete(&self, _key: Option<&str>) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "inline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_returns_inline_payload() {
        let store = InlineStore::new();
        let payload = store
            .put("ignored", vec![9, 9, 9], "image/png")
            .await
            .expect("inline put cannot fail");
        assert!(matches!(payload, BlobPayload::Inline(ref b) if b == &vec![9, 9, 9]));
    }

    #[tokio::test]
    async fn fetch_round_trips_inline_bytes() {
        let store = InlineStore::new();
        let bytes = store
            .fetch(StoredRef::new(Some(&[1, 2, 3]), None))
            .await
            .expect("inline fetch should succeed");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_without_payload_is_missing() {
        let store = InlineStore::new();
        let err = store.fetch(StoredRef::new(None, None)).await.unwrap_err();
        assert!(matches!(err, StorageError::Missing));
    }

    #[tokio::test]
    async fn delete_is_a_noop() {
        let store = InlineStore::new();
        store.delete(Some("whatever")).await.expect("no-op");
        store.delete(None).await.expect("no-op");
    }
}
