use std::sync::Arc;

use common::prelude::{AdminApi, AdminClient, AdminError, StorageClient, StorageError};

use crate::broker::{Broker, BrokerSettings};
use crate::config::{BrokerCredentials, Catalog, CatalogError, Config};

/// Everything the HTTP handlers need, cheap to clone
#[derive(Debug, Clone)]
pub struct State {
    broker: Arc<Broker>,
    catalog: Arc<Catalog>,
    credentials: BrokerCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to set up admin client: {0}")]
    Admin(#[from] AdminError),
    #[error("failed to set up storage client: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl State {
    pub fn new(broker: Broker, catalog: Catalog, credentials: BrokerCredentials) -> Self {
        Self {
            broker: Arc::new(broker),
            catalog: Arc::new(catalog),
            credentials,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StateError> {
        let catalog = Catalog::load(&config.catalog_path)?.with_documentation_url(&config.docs_url);
        tracing::info!(
            path = %config.catalog_path.display(),
            services = catalog.services.len(),
            "catalog loaded"
        );

        let admin: Arc<dyn AdminApi> = Arc::new(AdminClient::new(config.admin.clone())?);
        let storage = Arc::new(StorageClient::new(admin.clone(), config.storage.clone())?);

        let settings = BrokerSettings {
            path_style: config.storage.force_path_style,
            skip_tls_verify: config.storage.skip_tls_verify,
            max_group_pages: config.max_group_pages,
        };
        tracing::info!(
            admin = %config.admin.url,
            storage = %config.storage.endpoint,
            "backends configured"
        );

        Ok(Self::new(
            Broker::new(admin, storage, settings),
            catalog,
            config.credentials.clone(),
        ))
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn credentials(&self) -> &BrokerCredentials {
        &self.credentials
    }
}
