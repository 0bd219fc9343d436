use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::names::to_friendly_name;
use crate::storage::{StorageApi, StorageError, DEFAULT_REGION};

/// A call received by [`MemoryStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Create { name: String, region: String },
    Delete(String),
    Region(String),
    Versioning(String),
    EnableVersioning(String),
}

#[derive(Debug, Clone)]
struct StoredBucket {
    region: String,
    versioning: bool,
}

#[derive(Debug, Default)]
struct MemoryStorageInner {
    buckets: BTreeMap<String, StoredBucket>,
    calls: Vec<StorageCall>,
    /// friendly names whose creation fails
    fail_create: HashSet<String>,
    /// friendly names whose deletion fails
    fail_delete: HashSet<String>,
    /// friendly names whose versioning cannot be enabled
    fail_versioning: HashSet<String>,
}

/// In-memory object storage keyed by full bucket name
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    default_region: String,
    endpoint: String,
    inner: Arc<Mutex<MemoryStorageInner>>,
}

impl MemoryStorage {
    pub fn new(default_region: impl Into<String>) -> Self {
        Self {
            default_region: default_region.into(),
            endpoint: "https://s3.grid.test:10443".to_string(),
            inner: Arc::new(Mutex::new(MemoryStorageInner::default())),
        }
    }

    fn inner(&self) -> MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make creation fail for buckets with this friendly name
    pub fn fail_create(&self, friendly_name: &str) {
        self.inner().fail_create.insert(friendly_name.to_string());
    }

    /// Make deletion fail for buckets with this friendly name
    pub fn fail_delete(&self, friendly_name: &str) {
        self.inner().fail_delete.insert(friendly_name.to_string());
    }

    /// Make enabling versioning fail for buckets with this friendly name
    pub fn fail_versioning(&self, friendly_name: &str) {
        self.inner().fail_versioning.insert(friendly_name.to_string());
    }

    /// Put a bucket in place without recording a call
    pub fn insert_bucket(&self, name: &str, region: &str, versioning: bool) {
        self.inner().buckets.insert(
            name.to_string(),
            StoredBucket {
                region: region.to_string(),
                versioning,
            },
        );
    }

    /// Drop a bucket behind the broker's back
    pub fn remove_bucket(&self, name: &str) {
        self.inner().buckets.remove(name);
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.inner().buckets.keys().cloned().collect()
    }

    pub fn has_bucket(&self, name: &str) -> bool {
        self.inner().buckets.contains_key(name)
    }

    /// Region and versioning of a stored bucket
    pub fn bucket(&self, name: &str) -> Option<(String, bool)> {
        self.inner()
            .buckets
            .get(name)
            .map(|b| (b.region.clone(), b.versioning))
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.inner().calls.clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.inner()
            .calls
            .iter()
            .filter(|call| matches!(call, StorageCall::Delete(_)))
            .count()
    }
}

#[async_trait]
impl StorageApi for MemoryStorage {
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StorageError> {
        let region = if region.is_empty() {
            self.default_region.clone()
        } else {
            region.to_string()
        };

        let mut inner = self.inner();
        inner.calls.push(StorageCall::Create {
            name: name.to_string(),
            region: region.clone(),
        });

        if inner.fail_create.contains(to_friendly_name(name)) {
            return Err(StorageError::backend("create bucket", name, "InternalError: injected"));
        }
        if inner.buckets.contains_key(name) {
            return Err(StorageError::backend(
                "create bucket",
                name,
                "BucketAlreadyOwnedByYou",
            ));
        }

        inner.buckets.insert(
            name.to_string(),
            StoredBucket {
                region,
                versioning: false,
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.calls.push(StorageCall::Delete(name.to_string()));

        if inner.fail_delete.contains(to_friendly_name(name)) {
            return Err(StorageError::backend("delete bucket", name, "BucketNotEmpty: injected"));
        }

        inner
            .buckets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn bucket_region(&self, name: &str) -> Result<String, StorageError> {
        let mut inner = self.inner();
        inner.calls.push(StorageCall::Region(name.to_string()));

        inner
            .buckets
            .get(name)
            .map(|b| {
                if b.region.is_empty() {
                    DEFAULT_REGION.to_string()
                } else {
                    b.region.clone()
                }
            })
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn bucket_versioning(&self, name: &str) -> Result<bool, StorageError> {
        let mut inner = self.inner();
        inner.calls.push(StorageCall::Versioning(name.to_string()));

        inner
            .buckets
            .get(name)
            .map(|b| b.versioning)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn enable_versioning(&self, name: &str) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.calls.push(StorageCall::EnableVersioning(name.to_string()));

        if inner.fail_versioning.contains(to_friendly_name(name)) {
            return Err(StorageError::backend(
                "put bucket versioning",
                name,
                "NotImplemented: injected",
            ));
        }

        match inner.buckets.get_mut(name) {
            Some(bucket) => {
                bucket.versioning = true;
                Ok(())
            }
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }

    fn default_region(&self) -> &str {
        &self.default_region
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
