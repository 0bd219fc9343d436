use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod client;
mod error;

pub use client::{AdminClient, AdminConfig, GROUP_PAGE_SIZE};
pub use error::AdminError;

/// Envelope every admin API response is wrapped in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub response_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A tenant group. One group backs each service instance and its
///  `policies` document lists the instance's buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
    #[serde(default, rename = "groupURN", skip_serializing_if = "Option::is_none")]
    pub group_urn: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub federated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Value>,
}

impl Group {
    /// A local group ready to be created
    pub fn new(name: &str, policy: Value) -> Self {
        Self {
            display_name: name.to_string(),
            unique_name: format!("group/{}", name),
            policies: Some(policy),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub unique_name: String,
    #[serde(default, rename = "userURN")]
    pub user_urn: Option<String>,
    #[serde(default)]
    pub federated: bool,
    #[serde(default)]
    pub member_of: Vec<String>,
    #[serde(default)]
    pub disable: bool,
}

/// An S3 access key pair issued for a user
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "userURN")]
    pub user_urn: Option<String>,
    #[serde(default, rename = "userUUID")]
    pub user_uuid: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    pub access_key: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKey")
            .field("id", &self.id)
            .field("access_key", &self.access_key)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

/// Operations the broker needs from the tenant administration API.
///
/// Every method maps to exactly one backend call (after a login check).
///  Failures with a status the operation did not expect surface as
///  [`AdminError::UnexpectedStatus`].
#[async_trait]
pub trait AdminApi: Send + Sync + std::fmt::Debug {
    async fn create_group(&self, name: &str, policy: Value) -> Result<Group, AdminError>;

    /// Replace a group's definition, used to push a regenerated policy
    async fn update_group(&self, group: &Group) -> Result<Group, AdminError>;

    async fn delete_group(&self, id: &str) -> Result<(), AdminError>;

    async fn get_group_by_name(&self, name: &str) -> Result<Group, AdminError>;

    /// One page of local groups, starting after `marker` (a group id)
    async fn list_groups(&self, marker: Option<&str>) -> Result<Vec<Group>, AdminError>;

    async fn create_user(
        &self,
        name: &str,
        full_name: &str,
        member_of: &[String],
    ) -> Result<User, AdminError>;

    async fn get_user_by_name(&self, name: &str) -> Result<User, AdminError>;

    async fn delete_user(&self, id: &str) -> Result<(), AdminError>;

    /// Permanent S3 keys for a user
    async fn create_user_access_key(&self, user_id: &str) -> Result<AccessKey, AdminError>;

    /// Ephemeral S3 keys for the identity the client is logged in as
    async fn create_current_user_access_key(
        &self,
        expires: DateTime<Utc>,
    ) -> Result<AccessKey, AdminError>;
}
