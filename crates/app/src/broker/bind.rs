use url::Url;

use common::names::normalize_id;
use common::policy;
use common::prelude::AccessKey;

use super::{BindDetails, Binding, Broker, BrokerError, CredBucket, Credentials};

/// Host (and port) part of the storage endpoint, as used in access URIs
fn endpoint_host(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => endpoint.to_string(),
        },
        Err(_) => endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string(),
    }
}

fn escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn bucket_uri(key: &AccessKey, host: &str, bucket: &str) -> String {
    format!(
        "s3://{}:{}@{}/{}",
        escape(&key.access_key),
        escape(&key.secret_access_key),
        host,
        bucket
    )
}

impl Broker {
    /// Create a user in the instance's group and hand out its keys.
    ///
    /// Binding again with the same id reuses the existing user.
    #[tracing::instrument(skip(self, details), fields(instance = %instance_id, binding = %binding_id))]
    pub async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: BindDetails,
    ) -> Result<Binding, BrokerError> {
        let group_name = normalize_id(instance_id);
        let user_name = normalize_id(binding_id);

        let group = self.instance_group(&group_name).await?;
        let buckets = policy::decode(&group, self.storage.as_ref()).await?;

        let full_name = match details.app_guid() {
            "" => format!("Service Key in space GUID: {}", details.space_guid()),
            app_guid => format!("Binding to app GUID: {}", app_guid),
        };

        let user = match self
            .admin
            .create_user(&user_name, &full_name, std::slice::from_ref(&group.id))
            .await
        {
            Ok(user) => user,
            Err(e) if e.is_conflict() => {
                tracing::info!(user = %user_name, "user already exists, reusing it");
                self.admin.get_user_by_name(&user_name).await?
            }
            Err(e) => return Err(e.into()),
        };

        let key = self.admin.create_user_access_key(&user.id).await?;

        let endpoint = self.storage.endpoint();
        let host = endpoint_host(endpoint);
        let buckets = buckets
            .iter()
            .map(|(friendly_name, bucket)| CredBucket {
                uri: bucket_uri(&key, &host, &bucket.name),
                name: friendly_name.clone(),
                bucket: bucket.name.clone(),
                region: bucket.region.clone(),
                versioning: bucket.versioning,
            })
            .collect();

        tracing::info!(group = %group_name, user = %user_name, "binding created");

        Ok(Binding {
            is_async: false,
            credentials: Credentials {
                insecure_skip_verify: self.settings.skip_tls_verify,
                access_key_id: key.access_key,
                secret_access_key: key.secret_access_key,
                buckets,
                endpoint: endpoint.to_string(),
                path_style_access: self.settings.path_style,
            },
        })
    }
}
