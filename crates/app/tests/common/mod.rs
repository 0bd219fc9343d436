//! Broker wired to in-memory backends
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use common::admin::Group;
use common::names::{has_generated_suffix, to_friendly_name};
use common::policy;
use common::testkit::{MemoryAdmin, MemoryStorage};
use gridbroker::broker::{Broker, BrokerSettings, ProvisionDetails};
use gridbroker::config::{BrokerCredentials, Catalog};
use gridbroker::ServiceState;

pub const INSTANCE_ID: &str = "0e2c3a1f-5b6d-4c7e-8f90-a1b2c3d4e5f6";
pub const GROUP_NAME: &str = "0e2c3a1f5b6d4c7e8f90a1b2c3d4e5f6";
pub const BINDING_ID: &str = "7d9e0f12-3456-4789-abcd-ef0123456789";
pub const REGION: &str = "us-east-1";

pub struct Harness {
    pub admin: MemoryAdmin,
    pub storage: MemoryStorage,
    pub broker: Broker,
}

pub fn harness() -> Harness {
    harness_with(MemoryAdmin::new(), BrokerSettings::default())
}

pub fn harness_with(admin: MemoryAdmin, settings: BrokerSettings) -> Harness {
    let storage = MemoryStorage::new(REGION);
    let broker = Broker::new(
        Arc::new(admin.clone()),
        Arc::new(storage.clone()),
        settings,
    );
    Harness {
        admin,
        storage,
        broker,
    }
}

pub fn provision_details(parameters: Option<Value>) -> ProvisionDetails {
    ProvisionDetails {
        service_id: "service".to_string(),
        plan_id: "plan".to_string(),
        organization_guid: "org".to_string(),
        space_guid: "space".to_string(),
        parameters,
    }
}

pub fn buckets(names: &[&str]) -> Value {
    let requests: Vec<Value> = names.iter().map(|name| json!({"name": name})).collect();
    json!({ "buckets": requests })
}

/// Provision `INSTANCE_ID` with the given friendly names
pub async fn provisioned(h: &Harness, names: &[&str]) {
    h.broker
        .provision(INSTANCE_ID, provision_details(Some(buckets(names))))
        .await
        .unwrap();
}

/// Full bucket names listed in a group's policy
pub fn policy_buckets(group: &Group) -> Vec<String> {
    policy::bucket_names(group).unwrap()
}

/// Friendly names listed in the instance group's policy, sorted
pub fn policy_friendly_names(h: &Harness) -> Vec<String> {
    let group = h.admin.group(GROUP_NAME).unwrap();
    let mut names: Vec<String> = policy_buckets(&group)
        .iter()
        .map(|name| to_friendly_name(name).to_string())
        .collect();
    names.sort();
    names
}

/// Stored bucket whose friendly name is `friendly_name`
pub fn stored_bucket(h: &Harness, friendly_name: &str) -> Option<String> {
    h.storage
        .bucket_names()
        .into_iter()
        .find(|name| to_friendly_name(name) == friendly_name)
}

pub fn assert_generated(full_name: &str, friendly_name: &str) {
    assert_eq!(to_friendly_name(full_name), friendly_name);
    assert!(
        has_generated_suffix(full_name),
        "{} has no generated suffix",
        full_name
    );
}

pub const CATALOG: &str = r#"{
    "services": [{
        "id": "svc-1",
        "name": "storagegrid-s3",
        "description": "S3 buckets",
        "bindable": true,
        "plans": [{"id": "plan-1", "name": "default", "description": "default plan"}]
    }]
}"#;

pub const USERNAME: &str = "broker";
pub const PASSWORD: &str = "s3cret";

pub fn service_state(h: &Harness) -> ServiceState {
    let catalog = Catalog::from_json(CATALOG, "inline")
        .unwrap()
        .with_documentation_url("https://docs.example.com");
    ServiceState::new(
        h.broker.clone(),
        catalog,
        BrokerCredentials {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        },
    )
}
