mod common;

use serde_json::json;

use ::common::testkit::StorageCall;
use gridbroker::broker::BrokerError;

use crate::common::{
    assert_generated, harness, policy_buckets, policy_friendly_names, provision_details,
    provisioned, stored_bucket, GROUP_NAME, INSTANCE_ID, REGION,
};

#[tokio::test]
async fn test_provision_without_parameters_creates_default_bucket() {
    let h = harness();

    h.broker
        .provision(INSTANCE_ID, provision_details(None))
        .await
        .unwrap();

    let names = h.storage.bucket_names();
    assert_eq!(names.len(), 1);
    assert_generated(&names[0], "bucket");
    assert_eq!(h.storage.bucket(&names[0]), Some((REGION.to_string(), false)));

    let group = h.admin.group(GROUP_NAME).unwrap();
    assert_eq!(policy_buckets(&group), names);
}

#[tokio::test]
async fn test_provision_with_empty_object_creates_default_bucket() {
    let h = harness();

    h.broker
        .provision(INSTANCE_ID, provision_details(Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(policy_friendly_names(&h), vec!["bucket"]);
}

#[tokio::test]
async fn test_provision_requested_buckets() {
    let h = harness();
    let parameters = json!({
        "buckets": [
            {"name": "logs", "region": "eu-1"},
            {"name": "data", "region": "us-1", "versioning": true}
        ]
    });

    h.broker
        .provision(INSTANCE_ID, provision_details(Some(parameters)))
        .await
        .unwrap();

    let logs = stored_bucket(&h, "logs").unwrap();
    let data = stored_bucket(&h, "data").unwrap();
    assert_generated(&logs, "logs");
    assert_generated(&data, "data");
    assert_eq!(h.storage.bucket(&logs), Some(("eu-1".to_string(), false)));
    assert_eq!(h.storage.bucket(&data), Some(("us-1".to_string(), true)));
    assert_eq!(policy_friendly_names(&h), vec!["data", "logs"]);
}

#[tokio::test]
async fn test_failed_bucket_rolls_back_group_and_earlier_buckets() {
    let h = harness();
    h.storage.fail_create("data");
    let parameters = json!({
        "buckets": [
            {"name": "logs", "region": "eu-1"},
            {"name": "data", "region": "us-1", "versioning": true}
        ]
    });

    let err = h
        .broker
        .provision(INSTANCE_ID, provision_details(Some(parameters)))
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::Storage(_)));
    assert_eq!(h.admin.group_count(), 0);
    assert!(h.storage.bucket_names().is_empty());

    let deleted: Vec<String> = h
        .storage
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            StorageCall::Delete(name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(deleted.len(), 1);
    assert_generated(&deleted[0], "logs");

    let calls = h.admin.calls();
    assert_eq!(calls.last().map(String::as_str), Some("delete_group"));
}

#[tokio::test]
async fn test_second_provision_is_already_exists() {
    let h = harness();
    provisioned(&h, &["logs"]).await;

    let err = h
        .broker
        .provision(INSTANCE_ID, provision_details(None))
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::AlreadyExists));
    assert_eq!(h.storage.bucket_names().len(), 1);
    assert_eq!(h.admin.group_count(), 1);
}

#[tokio::test]
async fn test_explicit_empty_bucket_list() {
    let h = harness();

    h.broker
        .provision(INSTANCE_ID, provision_details(Some(json!({"buckets": []}))))
        .await
        .unwrap();

    let group = h.admin.group(GROUP_NAME).unwrap();
    assert_eq!(group.policies, Some(json!({})));
    assert!(h.storage.bucket_names().is_empty());
}

#[tokio::test]
async fn test_invalid_parameters_create_nothing() {
    let h = harness();

    let err = h
        .broker
        .provision(
            INSTANCE_ID,
            provision_details(Some(json!({"buckets": "logs"}))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::InvalidParameters(_)));
    assert_eq!(h.admin.group_count(), 0);
    assert!(h.storage.calls().is_empty());
}

#[tokio::test]
async fn test_versioning_failure_is_not_fatal() {
    let h = harness();
    h.storage.fail_versioning("data");
    let parameters = json!({"buckets": [{"name": "data", "versioning": true}]});

    h.broker
        .provision(INSTANCE_ID, provision_details(Some(parameters)))
        .await
        .unwrap();

    let data = stored_bucket(&h, "data").unwrap();
    assert_eq!(h.storage.bucket(&data), Some((REGION.to_string(), false)));
    assert_eq!(h.admin.group_count(), 1);
}
