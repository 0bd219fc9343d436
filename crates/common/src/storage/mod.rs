use async_trait::async_trait;

use crate::admin::AdminError;

mod client;
mod connector;

pub use client::{StorageClient, StorageConfig, CREDENTIAL_LIFETIME, DEFAULT_REGION};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend reported `NoSuchBucket`
    #[error("bucket not found: {0}")]
    NotFound(String),
    #[error("failed to obtain storage credentials: {0}")]
    Credentials(#[from] AdminError),
    #[error("{operation} failed for bucket {bucket}: {message}")]
    Backend {
        operation: &'static str,
        bucket: String,
        message: String,
    },
    #[error("storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn backend(operation: &'static str, bucket: &str, message: impl Into<String>) -> Self {
        StorageError::Backend {
            operation,
            bucket: bucket.to_string(),
            message: message.into(),
        }
    }
}

/// Bucket level operations against S3 compatible storage.
///
/// Every call is attempted once; nothing here retries.
#[async_trait]
pub trait StorageApi: Send + Sync + std::fmt::Debug {
    /// Create a bucket, in `default_region()` when `region` is empty
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StorageError>;

    /// Delete a bucket. A missing bucket is reported as [`StorageError::NotFound`].
    async fn delete_bucket(&self, name: &str) -> Result<(), StorageError>;

    /// The bucket's location constraint, `DEFAULT_REGION` when it has none
    async fn bucket_region(&self, name: &str) -> Result<String, StorageError>;

    /// Whether versioning is currently enabled on the bucket
    async fn bucket_versioning(&self, name: &str) -> Result<bool, StorageError>;

    async fn enable_versioning(&self, name: &str) -> Result<(), StorageError>;

    /// Region used for buckets requested without one
    fn default_region(&self) -> &str;

    /// Endpoint handed out to bound applications
    fn endpoint(&self) -> &str;
}
