//! S3 storage backend: payloads live in a bucket, rows keep the object key.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::{BlobPayload, ImageStore, StorageError, StoredRef};

/// Stores image payloads in an S3-compatible bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from the default AWS credential/region chain.
    pub async fn from_env(bucket: String) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket,
        }
    }

    /// Wrap an existing client (tests, custom endpoints).
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ImageStore for S3Store {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobPayload, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {e}")))?;

        tracing::debug!(bucket = %self.bucket, key, "Uploaded object");
        Ok(BlobPayload::Key(key.to_string()))
    }

    async fn fetch(&self, stored: StoredRef<'_>) -> Result<Vec<u8>, StorageError> {
        let key = stored.key.ok_or(StorageError::Missing)?;
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("get {key}: {e}")))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("read {key}: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: Option<&str>) -> Result<(), StorageError> {
        let Some(key) = key else {
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("delete {key}: {e}")))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
