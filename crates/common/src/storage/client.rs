use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    VersioningConfiguration,
};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use super::connector::ReqwestConnector;
use super::{StorageApi, StorageError};
use crate::admin::AdminApi;
use crate::session::SessionCache;

/// Region reported for buckets without a location constraint
pub const DEFAULT_REGION: &str = "us-east-1";

/// How long the broker's own storage keys stay valid
pub const CREDENTIAL_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Per request timeout against the storage endpoint
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const NO_SUCH_BUCKET: &str = "NoSuchBucket";

/// Configuration for connecting to the grid's S3 endpoint.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Endpoint URL (e.g., "https://s3.grid.example.com:10443")
    pub endpoint: String,
    /// Region for buckets requested without one
    pub region: String,
    /// Address buckets by path rather than virtual host
    pub force_path_style: bool,
    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,
}

impl StorageConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: DEFAULT_REGION.to_string(),
            force_path_style: true,
            skip_tls_verify: false,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_force_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }
}

/// S3 client for bucket lifecycle calls.
///
/// The broker never holds long lived storage keys. Before each call the
///  client makes sure it has a key pair minted for the admin identity that
///  has not yet expired, and builds a fresh SDK client whenever it mints
///  a new pair.
#[derive(Debug)]
pub struct StorageClient {
    admin: Arc<dyn AdminApi>,
    config: StorageConfig,
    connector: ReqwestConnector,
    session: SessionCache<Client>,
}

impl StorageClient {
    pub fn new(admin: Arc<dyn AdminApi>, config: StorageConfig) -> Result<Self, StorageError> {
        let connector = ReqwestConnector::new(config.skip_tls_verify, REQUEST_TIMEOUT)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            admin,
            config,
            connector,
            session: SessionCache::new(),
        })
    }

    async fn client(&self) -> Result<Client, StorageError> {
        self.session.get_valid(|| self.mint_client()).await
    }

    async fn mint_client(&self) -> Result<(Client, DateTime<Utc>), StorageError> {
        let lifetime = chrono::Duration::from_std(CREDENTIAL_LIFETIME)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        let expires_at = Utc::now() + lifetime;

        let key = self.admin.create_current_user_access_key(expires_at).await?;
        tracing::debug!(access_key = %key.access_key, %expires_at, "minted storage credentials");

        let credentials = Credentials::new(
            key.access_key,
            key.secret_access_key,
            None,
            None,
            "gridbroker",
        );

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&self.config.endpoint)
            .force_path_style(self.config.force_path_style)
            .http_client(self.connector.clone())
            .build();

        Ok((Client::from_conf(sdk_config), expires_at))
    }
}

fn map_sdk_error<E>(operation: &'static str, bucket: &str, err: E) -> StorageError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    if err.code() == Some(NO_SUCH_BUCKET) {
        return StorageError::NotFound(bucket.to_string());
    }
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => err.to_string(),
    };
    StorageError::backend(operation, bucket, message)
}

#[async_trait]
impl StorageApi for StorageClient {
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StorageError> {
        let region = if region.is_empty() {
            self.config.region.as_str()
        } else {
            region
        };

        let configuration = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build();

        self.client()
            .await?
            .create_bucket()
            .bucket(name)
            .create_bucket_configuration(configuration)
            .send()
            .await
            .map_err(|e| map_sdk_error("create bucket", name, e))?;

        tracing::info!(bucket = name, region, "bucket created");
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), StorageError> {
        self.client()
            .await?
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("delete bucket", name, e))?;

        tracing::info!(bucket = name, "bucket deleted");
        Ok(())
    }

    async fn bucket_region(&self, name: &str) -> Result<String, StorageError> {
        let output = self
            .client()
            .await?
            .get_bucket_location()
            .bucket(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("get bucket location", name, e))?;

        Ok(output
            .location_constraint()
            .map(|constraint| constraint.as_str())
            .filter(|region| !region.is_empty())
            .unwrap_or(DEFAULT_REGION)
            .to_string())
    }

    async fn bucket_versioning(&self, name: &str) -> Result<bool, StorageError> {
        let output = self
            .client()
            .await?
            .get_bucket_versioning()
            .bucket(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("get bucket versioning", name, e))?;

        Ok(matches!(output.status(), Some(BucketVersioningStatus::Enabled)))
    }

    async fn enable_versioning(&self, name: &str) -> Result<(), StorageError> {
        let configuration = VersioningConfiguration::builder()
            .status(BucketVersioningStatus::Enabled)
            .build();

        self.client()
            .await?
            .put_bucket_versioning()
            .bucket(name)
            .versioning_configuration(configuration)
            .send()
            .await
            .map_err(|e| map_sdk_error("put bucket versioning", name, e))?;

        tracing::info!(bucket = name, "versioning enabled");
        Ok(())
    }

    fn default_region(&self) -> &str {
        &self.config.region
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new("https://s3.example.com");
        assert_eq!(config.region, DEFAULT_REGION);
        assert!(config.force_path_style);
        assert!(!config.skip_tls_verify);

        let config = config
            .with_region("eu-1")
            .with_force_path_style(false)
            .with_skip_tls_verify(true);
        assert_eq!(config.region, "eu-1");
        assert!(!config.force_path_style);
        assert!(config.skip_tls_verify);
    }
}
