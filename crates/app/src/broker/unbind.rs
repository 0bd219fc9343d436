use common::names::normalize_id;

use super::{Broker, BrokerError, UnbindDetails, UnbindSpec};

impl Broker {
    /// Delete the user behind a binding. A user that cannot be found is an
    ///  error here, not a no-op.
    #[tracing::instrument(skip(self, _details), fields(instance = %instance_id, binding = %binding_id))]
    pub async fn unbind(
        &self,
        instance_id: &str,
        binding_id: &str,
        _details: UnbindDetails,
    ) -> Result<UnbindSpec, BrokerError> {
        let user_name = normalize_id(binding_id);

        let user = self.admin.get_user_by_name(&user_name).await?;
        self.admin.delete_user(&user.id).await?;

        tracing::info!(user = %user_name, "binding removed");
        Ok(UnbindSpec::default())
    }
}
