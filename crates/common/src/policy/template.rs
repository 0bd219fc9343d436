use askama::Template;

/// Group policy granting full S3 access to a set of buckets and their objects.
///
/// Every field is substituted verbatim and must already be valid JSON.
#[derive(Template)]
#[template(path = "group_policy.json", escape = "none")]
pub(crate) struct GroupPolicyTemplate {
    pub bucket_sid: String,
    pub object_sid: String,
    pub bucket_resources: String,
    pub object_resources: String,
}

impl GroupPolicyTemplate {
    pub(crate) fn new(
        instance_name: &str,
        bucket_resources: &[String],
        object_resources: &[String],
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            bucket_sid: serde_json::to_string(&format!("{}Buckets", instance_name))?,
            object_sid: serde_json::to_string(&format!("{}Objects", instance_name))?,
            bucket_resources: serde_json::to_string(bucket_resources)?,
            object_resources: serde_json::to_string(object_resources)?,
        })
    }
}
