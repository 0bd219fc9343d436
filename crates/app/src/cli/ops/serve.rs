use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;
use url::Url;

use common::prelude::{AdminConfig, StorageConfig};
use gridbroker::config::{parse_log_level, BrokerCredentials, ConfigError};
use gridbroker::broker::DEFAULT_MAX_GROUP_PAGES;
use gridbroker::{spawn_service, ServiceConfig};

/// Run the broker API
#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Username the platform uses for basic auth
    #[arg(long, env = "BROKER_USERNAME")]
    pub broker_username: String,

    #[arg(long, env = "BROKER_PASSWORD", hide_env_values = true)]
    pub broker_password: String,

    /// Tenant administration API, e.g. https://grid.example.com
    #[arg(long, env = "STORAGEGRID_ADMIN_URL")]
    pub admin_url: Url,

    #[arg(long, env = "STORAGEGRID_ACCOUNT_ID", default_value = "")]
    pub account_id: String,

    #[arg(long, env = "STORAGEGRID_TENANT_USERNAME", default_value = "")]
    pub tenant_username: String,

    #[arg(
        long,
        env = "STORAGEGRID_TENANT_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub tenant_password: String,

    /// Accept invalid TLS certificates from both backends
    #[arg(long, env = "STORAGEGRID_SKIP_SSL_CHECK", default_value_t = false)]
    pub skip_ssl_check: bool,

    /// S3 endpoint of the grid
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: String,

    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,

    #[arg(long, env = "S3_PATH_STYLE", default_value_t = true, action = clap::ArgAction::Set)]
    pub s3_path_style: bool,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Documentation link injected into the catalog
    #[arg(long, env = "DOCSURL", default_value = "")]
    pub docs_url: String,

    #[arg(long, env = "CATALOG_PATH", default_value = "./catalog.json")]
    pub catalog_path: PathBuf,

    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Most group pages read while looking up a bucket's owner
    #[arg(long, env = "MAX_GROUP_PAGES", default_value_t = DEFAULT_MAX_GROUP_PAGES)]
    pub max_group_pages: usize,
}

impl Serve {
    fn to_config(&self) -> Result<ServiceConfig, ConfigError> {
        let admin = AdminConfig {
            url: self.admin_url.clone(),
            account_id: self.account_id.clone(),
            username: self.tenant_username.clone(),
            password: self.tenant_password.clone(),
            skip_tls_verify: self.skip_ssl_check,
        };
        let storage = StorageConfig::new(self.s3_endpoint.clone())
            .with_region(self.s3_region.clone())
            .with_force_path_style(self.s3_path_style)
            .with_skip_tls_verify(self.skip_ssl_check);

        Ok(ServiceConfig {
            credentials: BrokerCredentials {
                username: self.broker_username.clone(),
                password: self.broker_password.clone(),
            },
            listen_addr: SocketAddr::from(([0, 0, 0, 0], self.port)),
            catalog_path: self.catalog_path.clone(),
            docs_url: self.docs_url.clone(),
            admin,
            storage,
            max_group_pages: self.max_group_pages.max(1),
            log_level: parse_log_level(&self.log_level)?,
            log_dir: self.log_dir.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.to_config()?;
        spawn_service(&config).await;
        Ok("broker stopped".to_string())
    }
}
