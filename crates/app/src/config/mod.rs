use std::net::SocketAddr;
use std::path::PathBuf;

use common::prelude::{AdminConfig, StorageConfig};

mod catalog;

pub use catalog::{Catalog, CatalogError, Plan, Service, ServiceMetadata};

/// Credentials the platform must present on every broker call
#[derive(Clone)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // broker api
    /// basic auth credentials for the broker API
    pub credentials: BrokerCredentials,
    /// address the broker API listens on
    pub listen_addr: SocketAddr,
    /// catalog served on `/v2/catalog`
    pub catalog_path: PathBuf,
    /// documentation link injected into every catalog service
    pub docs_url: String,

    // backends
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    /// cap on group pages read while looking up a bucket's owner
    pub max_group_pages: usize,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid log level: {0}")]
    LogLevel(String),
}

/// Parse a log level the way operators tend to write it (`INFO`, `debug`, ...).
///
/// `FATAL` has no tracing equivalent and maps to `ERROR`.
pub fn parse_log_level(raw: &str) -> Result<tracing::Level, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "FATAL" => Ok(tracing::Level::ERROR),
        other => other
            .parse()
            .map_err(|_| ConfigError::LogLevel(raw.to_string())),
    }
}
