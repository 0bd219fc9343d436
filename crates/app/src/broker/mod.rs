//! Service instance lifecycle.
//!
//! Every lifecycle call runs to completion before returning; nothing here
//!  is asynchronous from the platform's point of view. The only record of
//!  which buckets belong to an instance is the policy on the instance's
//!  group, so every flow starts by reading that policy back and ends by
//!  pushing whatever it has confirmed.

use std::fmt;
use std::sync::Arc;

use common::prelude::{AdminApi, AdminError, PolicyError, StorageApi, StorageError};

mod bind;
mod delete_buckets;
mod deprovision;
mod ownership;
mod params;
mod provision;
mod rollback;
mod types;
mod unbind;
mod update;

pub use delete_buckets::DeleteOutcome;
pub use params::BucketRequest;
pub use types::*;

/// Page cap for the ownership scan when none is configured
pub const DEFAULT_MAX_GROUP_PAGES: usize = 1000;

/// Settings handed out with binding credentials and used to bound scans
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Bound applications should address buckets by path
    pub path_style: bool,
    /// Bound applications may skip TLS verification against storage
    pub skip_tls_verify: bool,
    /// Most group pages the ownership scan will request
    pub max_group_pages: usize,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            path_style: true,
            skip_tls_verify: false,
            max_group_pages: DEFAULT_MAX_GROUP_PAGES,
        }
    }
}

/// Which bucket operation a [`BucketFailure`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOperation {
    Create,
    Delete,
}

impl fmt::Display for BucketOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketOperation::Create => write!(f, "create"),
            BucketOperation::Delete => write!(f, "delete"),
        }
    }
}

/// One bucket that could not be created or deleted
#[derive(Debug)]
pub struct BucketFailure {
    pub operation: BucketOperation,
    pub friendly_name: String,
    pub name: String,
    pub error: StorageError,
}

impl fmt::Display for BucketFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to {} bucket {} ({}): {}",
            self.operation, self.friendly_name, self.name, self.error
        )
    }
}

fn join_failures(failures: &[BucketFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("instance already exists")]
    AlreadyExists,
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("{0} are not retrievable")]
    NotRetrievable(&'static str),
    #[error("admin API error: {0}")]
    Admin(#[from] AdminError),
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{} bucket operation(s) failed: {}", .0.len(), join_failures(.0))]
    PartialFailure(Vec<BucketFailure>),
}

impl BrokerError {
    /// Per bucket failures, when the call got far enough to have any
    pub fn failures(&self) -> &[BucketFailure] {
        match self {
            BrokerError::PartialFailure(failures) => failures,
            _ => &[],
        }
    }
}

/// Maps lifecycle calls onto the admin and storage backends.
///
/// Holds nothing but the two backends and a few settings; groups, buckets
///  and users are re-read from the backends on every call.
#[derive(Debug, Clone)]
pub struct Broker {
    admin: Arc<dyn AdminApi>,
    storage: Arc<dyn StorageApi>,
    settings: BrokerSettings,
}

impl Broker {
    pub fn new(
        admin: Arc<dyn AdminApi>,
        storage: Arc<dyn StorageApi>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            admin,
            storage,
            settings,
        }
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Instances are not persisted anywhere we could read them back from
    pub async fn get_instance(
        &self,
        _instance_id: &str,
    ) -> Result<GetInstanceDetailsSpec, BrokerError> {
        Err(BrokerError::NotRetrievable("instances"))
    }

    pub async fn get_binding(
        &self,
        _instance_id: &str,
        _binding_id: &str,
    ) -> Result<GetBindingSpec, BrokerError> {
        Err(BrokerError::NotRetrievable("bindings"))
    }

    /// Every operation finishes before its call returns, so there is never
    ///  anything in flight to report on.
    pub async fn last_operation(
        &self,
        _instance_id: &str,
        _details: PollDetails,
    ) -> Result<LastOperation, BrokerError> {
        Ok(LastOperation::succeeded())
    }

    pub async fn last_binding_operation(
        &self,
        _instance_id: &str,
        _binding_id: &str,
        _details: PollDetails,
    ) -> Result<LastOperation, BrokerError> {
        Ok(LastOperation::succeeded())
    }

    /// Look up an instance's group, mapping a 404 to [`BrokerError::NotFound`]
    async fn instance_group(&self, group_name: &str) -> Result<common::admin::Group, BrokerError> {
        self.admin
            .get_group_by_name(group_name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    BrokerError::NotFound(format!("instance {}", group_name))
                } else {
                    BrokerError::Admin(e)
                }
            })
    }
}
