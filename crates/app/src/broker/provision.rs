use common::names::normalize_id;
use common::policy;

use super::params::provision_buckets;
use super::rollback::{Rollback, Undo};
use super::{Broker, BrokerError, ProvisionDetails, ProvisionedServiceSpec};

impl Broker {
    /// Create the group for a new instance, then its buckets one by one.
    ///
    /// The group goes first so that a crash part way through leaves a
    ///  group whose policy already names every bucket we meant to create.
    ///  If any bucket fails, the buckets created so far and the group are
    ///  removed again before the error is returned.
    #[tracing::instrument(skip(self, details), fields(instance = %instance_id))]
    pub async fn provision(
        &self,
        instance_id: &str,
        details: ProvisionDetails,
    ) -> Result<ProvisionedServiceSpec, BrokerError> {
        let group_name = normalize_id(instance_id);
        let buckets = provision_buckets(details.parameters.as_ref(), self.storage.default_region())?;
        let policy = policy::encode(&group_name, &buckets)?;

        tracing::info!(group = %group_name, buckets = buckets.len(), "creating group");
        let group = self
            .admin
            .create_group(&group_name, policy)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    BrokerError::AlreadyExists
                } else {
                    BrokerError::Admin(e)
                }
            })?;

        let mut rollback = Rollback::new(self.admin.as_ref(), self.storage.as_ref());
        rollback.push(Undo::DeleteGroup {
            id: group.id.clone(),
            name: group_name.clone(),
        });

        for bucket in &buckets {
            tracing::info!(bucket = %bucket.name, region = %bucket.region, "creating bucket");
            if let Err(e) = self.storage.create_bucket(&bucket.name, &bucket.region).await {
                tracing::error!(bucket = %bucket.name, error = %e, "bucket creation failed, rolling back");
                rollback.run().await;
                return Err(BrokerError::Storage(e));
            }
            rollback.push(Undo::DeleteBucket {
                name: bucket.name.clone(),
            });

            if bucket.versioning {
                if let Err(e) = self.storage.enable_versioning(&bucket.name).await {
                    tracing::warn!(bucket = %bucket.name, error = %e, "failed to enable versioning");
                }
            }
        }

        rollback.commit();
        tracing::info!(group = %group_name, "instance provisioned");

        Ok(ProvisionedServiceSpec::default())
    }
}
