use std::collections::BTreeMap;

use common::names::normalize_id;
use common::policy;
use common::prelude::BucketSet;

use super::delete_buckets::delete_buckets;
use super::params::{update_buckets, BucketRequest};
use super::{
    Broker, BrokerError, BucketFailure, BucketOperation, UpdateDetails, UpdateServiceSpec,
};

impl Broker {
    /// Reconcile an instance's buckets with the list in the request.
    ///
    /// Buckets missing from the request are deleted, new ones are created.
    ///  Whatever actually happened is written back to the group policy even
    ///  when some of it failed, and every failure is reported together.
    #[tracing::instrument(skip(self, details), fields(instance = %instance_id))]
    pub async fn update(
        &self,
        instance_id: &str,
        details: UpdateDetails,
    ) -> Result<UpdateServiceSpec, BrokerError> {
        let group_name = normalize_id(instance_id);
        let group = self.instance_group(&group_name).await?;
        let mut current = policy::decode(&group, self.storage.as_ref()).await?;

        let requested: BTreeMap<String, BucketRequest> = update_buckets(details.parameters.as_ref())?
            .into_iter()
            .map(|request| (request.friendly_name().to_string(), request))
            .collect();

        let to_delete: BucketSet = current
            .iter()
            .filter(|(friendly_name, _)| !requested.contains_key(*friendly_name))
            .map(|(friendly_name, bucket)| (friendly_name.clone(), bucket.clone()))
            .collect();

        let mut failures = Vec::new();

        if !to_delete.is_empty() {
            let (deleted, delete_failures) = delete_buckets(self.storage.as_ref(), &to_delete).await;
            current.retain(|friendly_name, _| !deleted.contains_key(friendly_name));
            failures.extend(delete_failures);
        }

        for (friendly_name, request) in &requested {
            if let Some(existing) = current.get_mut(friendly_name) {
                if request.versioning && !existing.versioning {
                    match self.storage.enable_versioning(&existing.name).await {
                        Ok(()) => existing.versioning = true,
                        Err(e) => {
                            tracing::warn!(bucket = %existing.name, error = %e, "failed to enable versioning")
                        }
                    }
                }
                continue;
            }

            let mut bucket = request.to_bucket(self.storage.default_region());
            tracing::info!(bucket = %bucket.name, region = %bucket.region, "creating bucket");
            if let Err(error) = self.storage.create_bucket(&bucket.name, &bucket.region).await {
                tracing::warn!(bucket = %bucket.name, error = %error, "bucket creation failed");
                failures.push(BucketFailure {
                    operation: BucketOperation::Create,
                    friendly_name: friendly_name.clone(),
                    name: bucket.name,
                    error,
                });
                continue;
            }

            if bucket.versioning {
                if let Err(e) = self.storage.enable_versioning(&bucket.name).await {
                    tracing::warn!(bucket = %bucket.name, error = %e, "failed to enable versioning");
                    bucket.versioning = false;
                }
            }
            current.insert(friendly_name.clone(), bucket);
        }

        let mut updated = group.clone();
        updated.policies = Some(policy::encode(&group_name, current.values())?);
        self.admin.update_group(&updated).await?;

        if !failures.is_empty() {
            tracing::warn!(group = %group_name, failures = failures.len(), "update partially failed");
            return Err(BrokerError::PartialFailure(failures));
        }

        tracing::info!(group = %group_name, buckets = current.len(), "instance updated");
        Ok(UpdateServiceSpec::default())
    }
}
