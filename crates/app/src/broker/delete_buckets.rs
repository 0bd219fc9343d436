use futures::future::join_all;

use common::prelude::{Bucket, BucketSet, StorageApi, StorageError};

use super::{BucketFailure, BucketOperation};

/// Result of deleting one bucket
#[derive(Debug)]
pub struct DeleteOutcome {
    pub friendly_name: String,
    pub name: String,
    pub region: String,
    pub deleted: bool,
    pub error: Option<StorageError>,
}

async fn delete_one(storage: &dyn StorageApi, friendly_name: &str, bucket: &Bucket) -> DeleteOutcome {
    tracing::info!(bucket = %bucket.name, "deleting bucket");

    let error = match storage.delete_bucket(&bucket.name).await {
        Ok(()) => None,
        Err(StorageError::NotFound(_)) => {
            tracing::debug!(bucket = %bucket.name, "bucket already gone");
            None
        }
        Err(e) => {
            tracing::warn!(bucket = %bucket.name, error = %e, "failed to delete bucket");
            Some(e)
        }
    };

    DeleteOutcome {
        friendly_name: friendly_name.to_string(),
        name: bucket.name.clone(),
        region: bucket.region.clone(),
        deleted: error.is_none(),
        error,
    }
}

/// Delete every bucket in `buckets` at once.
///
/// Waits for all deletions to finish; one failing does not stop the
///  others. A bucket that no longer exists counts as deleted. Returns the
///  buckets that are gone and a failure for each one that is not.
pub(crate) async fn delete_buckets(
    storage: &dyn StorageApi,
    buckets: &BucketSet,
) -> (BucketSet, Vec<BucketFailure>) {
    let outcomes = join_all(
        buckets
            .iter()
            .map(|(friendly_name, bucket)| delete_one(storage, friendly_name, bucket)),
    )
    .await;

    let mut deleted = BucketSet::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        if let Some(error) = outcome.error {
            failures.push(BucketFailure {
                operation: BucketOperation::Delete,
                friendly_name: outcome.friendly_name,
                name: outcome.name,
                error,
            });
            continue;
        }

        deleted.insert(
            outcome.friendly_name,
            Bucket::new(outcome.name, outcome.region, false),
        );
    }

    (deleted, failures)
}
