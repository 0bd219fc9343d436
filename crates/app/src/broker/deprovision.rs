use common::names::normalize_id;
use common::policy;

use super::delete_buckets::delete_buckets;
use super::{Broker, BrokerError, DeprovisionDetails, DeprovisionServiceSpec};

impl Broker {
    /// Delete an instance's buckets and then its group.
    ///
    /// A missing group means the instance is already gone. When some
    ///  buckets cannot be deleted the group is kept, its policy is cut down
    ///  to the buckets that remain, and the call fails so it can be retried.
    #[tracing::instrument(skip(self, _details), fields(instance = %instance_id))]
    pub async fn deprovision(
        &self,
        instance_id: &str,
        _details: DeprovisionDetails,
    ) -> Result<DeprovisionServiceSpec, BrokerError> {
        let group_name = normalize_id(instance_id);

        let group = match self.admin.get_group_by_name(&group_name).await {
            Ok(group) => group,
            Err(e) if e.is_not_found() => {
                tracing::info!(group = %group_name, "group not found, nothing to deprovision");
                return Ok(DeprovisionServiceSpec::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut buckets = policy::decode(&group, self.storage.as_ref()).await?;
        let (deleted, failures) = delete_buckets(self.storage.as_ref(), &buckets).await;

        if !failures.is_empty() {
            buckets.retain(|friendly_name, _| !deleted.contains_key(friendly_name));

            if buckets.is_empty() {
                tracing::warn!(
                    group = %group_name,
                    failures = failures.len(),
                    "deletions reported errors but no buckets remain, deleting group"
                );
            } else {
                let mut updated = group.clone();
                updated.policies = Some(policy::encode(&group_name, buckets.values())?);
                self.admin.update_group(&updated).await?;

                tracing::warn!(
                    group = %group_name,
                    remaining = buckets.len(),
                    "some buckets could not be deleted, group kept"
                );
                return Err(BrokerError::PartialFailure(failures));
            }
        }

        self.admin.delete_group(&group.id).await?;
        tracing::info!(group = %group_name, "instance deprovisioned");

        Ok(DeprovisionServiceSpec::default())
    }
}
