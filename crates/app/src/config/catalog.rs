use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Service metadata. Only the documentation URL is touched by the broker;
///  everything else is passed through as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    #[serde(rename = "documentationUrl", default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    #[serde(default)]
    pub plan_updateable: bool,
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub metadata: ServiceMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The broker's service catalog as served on `/v2/catalog`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

impl Catalog {
    pub fn from_json(raw: &str, path: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Read the catalog from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&raw, &display)
    }

    /// Point every service's documentation link at `url`
    pub fn with_documentation_url(mut self, url: &str) -> Self {
        for service in &mut self.services {
            service.metadata.documentation_url = Some(url.to_string());
        }
        self
    }
}
