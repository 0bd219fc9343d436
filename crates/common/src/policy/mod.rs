//! Bucket membership encoded in group policy documents.
//!
//! An instance has no record of its buckets other than the policy on its
//!  group. [`encode`] renders that policy from a set of buckets; [`decode`]
//!  reads it back and fills in what storage currently reports for each
//!  bucket.

use std::collections::BTreeMap;

use askama::Template;
use serde::Deserialize;
use serde_json::Value;

use crate::admin::Group;
use crate::names::to_friendly_name;
use crate::storage::{StorageApi, StorageError};

mod template;

use template::GroupPolicyTemplate;

/// Prefix of every S3 resource locator in a grid policy
pub const RESOURCE_PREFIX: &str = "urn:sgws:s3:::";

/// A bucket as the broker sees it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    /// Full, globally unique storage name
    pub name: String,
    /// Empty when the bucket is listed in policy but missing from storage
    pub region: String,
    pub versioning: bool,
}

impl Bucket {
    pub fn new(name: impl Into<String>, region: impl Into<String>, versioning: bool) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            versioning,
        }
    }

    pub fn friendly_name(&self) -> &str {
        to_friendly_name(&self.name)
    }
}

/// Buckets keyed by friendly name
pub type BucketSet = BTreeMap<String, Bucket>;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("unable to parse policy for group {group}: {source}")]
    Parse {
        group: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render group policy: {0}")]
    Render(#[from] askama::Error),
    #[error("group policy template produced invalid JSON: {0}")]
    Template(#[from] serde_json::Error),
    #[error("unable to inspect bucket {bucket}: {source}")]
    Storage {
        bucket: String,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    s3: Option<S3Policy>,
}

#[derive(Debug, Deserialize)]
struct S3Policy {
    #[serde(rename = "Statement", default)]
    statements: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct Statement {
    #[serde(rename = "Resource", default)]
    resource: Option<Resources>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Resources {
    One(String),
    Many(Vec<String>),
}

impl Resources {
    fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Resources::One(one) => std::slice::from_ref(one),
            Resources::Many(many) => many,
        };
        slice.iter().map(String::as_str)
    }
}

/// Render the policy for an instance's group.
///
/// Each bucket contributes a bucket locator and a `/*` object locator. An
///  empty set yields `{}`, which the admin API accepts as a group without
///  S3 access.
pub fn encode<'a, I>(instance_name: &str, buckets: I) -> Result<Value, PolicyError>
where
    I: IntoIterator<Item = &'a Bucket>,
{
    let (bucket_resources, object_resources): (Vec<String>, Vec<String>) = buckets
        .into_iter()
        .map(|bucket| {
            (
                format!("{}{}", RESOURCE_PREFIX, bucket.name),
                format!("{}{}/*", RESOURCE_PREFIX, bucket.name),
            )
        })
        .unzip();

    if bucket_resources.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let rendered =
        GroupPolicyTemplate::new(instance_name, &bucket_resources, &object_resources)?.render()?;
    Ok(serde_json::from_str(&rendered)?)
}

/// Full bucket names listed in a group's policy, in document order.
///
/// Only bucket locators count; object locators (`<name>/*`) and resources
///  outside the S3 namespace are skipped.
pub fn bucket_names(group: &Group) -> Result<Vec<String>, PolicyError> {
    let Some(policy) = group.policies.as_ref() else {
        return Ok(Vec::new());
    };
    if policy.is_null() {
        return Ok(Vec::new());
    }

    let document =
        PolicyDocument::deserialize(policy).map_err(|source| PolicyError::Parse {
            group: group.display_name.clone(),
            source,
        })?;

    let mut names: Vec<String> = Vec::new();
    let statements = document.s3.map(|s3| s3.statements).unwrap_or_default();
    for resource in statements
        .iter()
        .filter_map(|statement| statement.resource.as_ref())
        .flat_map(Resources::iter)
    {
        let Some(name) = resource.strip_prefix(RESOURCE_PREFIX) else {
            continue;
        };
        if name.is_empty() || name.contains('/') {
            continue;
        }
        if !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

/// Read the buckets of a group back out of its policy.
///
/// Region and versioning come from storage, not from the policy. A bucket
///  that is listed but no longer exists is kept with an empty region so
///  callers can still clean it out of the policy.
pub async fn decode(group: &Group, storage: &dyn StorageApi) -> Result<BucketSet, PolicyError> {
    let mut buckets = BucketSet::new();

    for name in bucket_names(group)? {
        let bucket = match storage.bucket_region(&name).await {
            Ok(region) => {
                let versioning = storage.bucket_versioning(&name).await.unwrap_or_else(|e| {
                    tracing::debug!(bucket = %name, error = %e, "unable to read versioning state");
                    false
                });
                Bucket::new(name, region, versioning)
            }
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(
                    bucket = %name,
                    group = %group.display_name,
                    "bucket in policy but not found in storage"
                );
                Bucket::new(name, "", false)
            }
            Err(source) => return Err(PolicyError::Storage { bucket: name, source }),
        };

        buckets.insert(bucket.friendly_name().to_string(), bucket);
    }

    Ok(buckets)
}
