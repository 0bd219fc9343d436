use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: String,
    #[serde(default)]
    pub space_guid: String,
    /// Raw request parameters, absent when the platform sent none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionedServiceSpec {
    #[serde(skip)]
    pub is_async: bool,
    #[serde(skip)]
    pub already_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(rename = "operation", skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeprovisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeprovisionServiceSpec {
    #[serde(skip)]
    pub is_async: bool,
    #[serde(rename = "operation", skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviousValues {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub previous_values: PreviousValues,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateServiceSpec {
    #[serde(skip)]
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(rename = "operation", skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindResource {
    #[serde(default)]
    pub app_guid: String,
    #[serde(default)]
    pub space_guid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    /// Deprecated by the protocol in favour of `bind_resource.app_guid`
    #[serde(default)]
    pub app_guid: String,
    #[serde(default)]
    pub bind_resource: Option<BindResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl BindDetails {
    pub fn app_guid(&self) -> &str {
        if !self.app_guid.is_empty() {
            return &self.app_guid;
        }
        self.bind_resource
            .as_ref()
            .map(|r| r.app_guid.as_str())
            .unwrap_or_default()
    }

    pub fn space_guid(&self) -> &str {
        self.bind_resource
            .as_ref()
            .map(|r| r.space_guid.as_str())
            .unwrap_or_default()
    }
}

/// One bucket as handed to a bound application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredBucket {
    pub uri: String,
    /// Friendly name
    pub name: String,
    /// Full storage name
    pub bucket: String,
    pub region: String,
    pub versioning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub insecure_skip_verify: bool,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(rename = "bucket")]
    pub buckets: Vec<CredBucket>,
    pub endpoint: String,
    #[serde(rename = "pathStyleAccess")]
    pub path_style_access: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    #[serde(skip)]
    pub is_async: bool,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnbindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnbindSpec {
    #[serde(skip)]
    pub is_async: bool,
    #[serde(rename = "operation", skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetInstanceDetailsSpec {
    pub service_id: String,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetBindingSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollDetails {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LastOperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastOperation {
    pub state: LastOperationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LastOperation {
    pub fn succeeded() -> Self {
        Self {
            state: LastOperationState::Succeeded,
            description: None,
        }
    }
}
