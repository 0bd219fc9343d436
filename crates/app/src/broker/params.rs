use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use common::names::{clamp_friendly_name, to_full_name, DEFAULT_FRIENDLY_NAME};
use common::prelude::Bucket;

use super::BrokerError;

/// A bucket as requested in provision or update parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BucketRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub versioning: bool,
}

impl BucketRequest {
    /// The name this bucket will be known by, truncated to fit in a
    ///  generated name
    pub fn friendly_name(&self) -> &str {
        match clamp_friendly_name(&self.name) {
            "" => DEFAULT_FRIENDLY_NAME,
            name => name,
        }
    }

    /// A new bucket for this request with a freshly generated name
    pub fn to_bucket(&self, default_region: &str) -> Bucket {
        let region = if self.region.is_empty() {
            default_region
        } else {
            self.region.as_str()
        };
        Bucket::new(to_full_name(self.friendly_name()), region, self.versioning)
    }
}

#[derive(Debug, Deserialize)]
struct BucketParameters {
    #[serde(default)]
    buckets: Option<Vec<BucketRequest>>,
}

fn parse(parameters: &Value) -> Result<BucketParameters, BrokerError> {
    BucketParameters::deserialize(parameters)
        .map_err(|e| BrokerError::InvalidParameters(e.to_string()))
}

fn is_absent(parameters: &Value) -> bool {
    match parameters {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Buckets to create for a new instance.
///
/// Without parameters (or without a `buckets` key) an instance gets one
///  default bucket in `default_region`. An explicit empty list means no
///  buckets at all.
pub(crate) fn provision_buckets(
    parameters: Option<&Value>,
    default_region: &str,
) -> Result<Vec<Bucket>, BrokerError> {
    let requests = match parameters {
        Some(parameters) if !is_absent(parameters) => parse(parameters)?.buckets,
        _ => None,
    };

    Ok(match requests {
        Some(requests) => collapse_by_friendly_name(&requests)
            .into_iter()
            .map(|request| request.to_bucket(default_region))
            .collect(),
        None => vec![BucketRequest::default().to_bucket(default_region)],
    })
}

/// One request per friendly name, in first-seen order.
///
/// The policy keys buckets by friendly name, so two requests that clamp to
///  the same name would otherwise produce a bucket the instance cannot find
///  again. Later requests override the region and versioning of earlier ones.
fn collapse_by_friendly_name(requests: &[BucketRequest]) -> Vec<&BucketRequest> {
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    let mut collapsed: Vec<&BucketRequest> = Vec::with_capacity(requests.len());

    for request in requests {
        match positions.get(request.friendly_name()) {
            Some(&index) => collapsed[index] = request,
            None => {
                positions.insert(request.friendly_name(), collapsed.len());
                collapsed.push(request);
            }
        }
    }
    collapsed
}

/// Buckets an update asks the instance to end up with.
///
/// Updates must always declare the full bucket list, so missing
///  parameters are an error rather than "no change".
pub(crate) fn update_buckets(
    parameters: Option<&Value>,
) -> Result<Vec<BucketRequest>, BrokerError> {
    let Some(parameters) = parameters.filter(|p| !is_absent(p)) else {
        return Err(BrokerError::InvalidParameters(
            "update requires a bucket list".to_string(),
        ));
    };

    parse(parameters)?.buckets.ok_or_else(|| {
        BrokerError::InvalidParameters("update parameters carry no `buckets` key".to_string())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use common::names::{has_generated_suffix, to_friendly_name};

    #[test]
    fn test_missing_parameters_give_one_default_bucket() {
        for parameters in [None, Some(json!(null)), Some(json!({}))] {
            let buckets = provision_buckets(parameters.as_ref(), "us-east-1").unwrap();
            assert_eq!(buckets.len(), 1);
            assert!(buckets[0].name.starts_with("bucket-"));
            assert!(has_generated_suffix(&buckets[0].name));
            assert_eq!(buckets[0].region, "us-east-1");
            assert!(!buckets[0].versioning);
        }
    }

    #[test]
    fn test_explicit_empty_list_gives_no_buckets() {
        let parameters = json!({"buckets": []});
        assert!(provision_buckets(Some(&parameters), "us-east-1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_requested_buckets_keep_region_and_versioning() {
        let parameters = json!({
            "buckets": [
                {"name": "logs", "region": "eu-1"},
                {"name": "data", "region": "us-1", "versioning": true},
                {"name": "scratch"}
            ]
        });
        let buckets = provision_buckets(Some(&parameters), "us-east-1").unwrap();

        let summary: Vec<_> = buckets
            .iter()
            .map(|b| (b.friendly_name(), b.region.as_str(), b.versioning))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("logs", "eu-1", false),
                ("data", "us-1", true),
                ("scratch", "us-east-1", false),
            ]
        );
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "a".repeat(40);
        let parameters = json!({"buckets": [{"name": long}]});
        let buckets = provision_buckets(Some(&parameters), "us-east-1").unwrap();
        assert_eq!(to_friendly_name(&buckets[0].name), "a".repeat(27));
        assert_eq!(buckets[0].name.len(), 27 + 33);
    }

    #[test]
    fn test_names_that_clamp_alike_share_one_bucket() {
        let prefix = "x".repeat(27);
        let parameters = json!({
            "buckets": [
                {"name": format!("{}a", prefix), "region": "eu-1"},
                {"name": "logs"},
                {"name": format!("{}b", prefix), "versioning": true},
                {"name": "logs", "region": "us-1"}
            ]
        });
        let buckets = provision_buckets(Some(&parameters), "us-east-1").unwrap();

        let summary: Vec<_> = buckets
            .iter()
            .map(|b| (b.friendly_name(), b.region.as_str(), b.versioning))
            .collect();
        assert_eq!(
            summary,
            vec![(prefix.as_str(), "us-east-1", true), ("logs", "us-1", false)]
        );
    }

    #[test]
    fn test_malformed_parameters_are_rejected() {
        for parameters in [json!("buckets"), json!({"buckets": "logs"})] {
            let err = provision_buckets(Some(&parameters), "us-east-1").unwrap_err();
            assert!(matches!(err, BrokerError::InvalidParameters(_)));
        }
    }

    #[test]
    fn test_update_requires_bucket_list() {
        for parameters in [None, Some(json!({})), Some(json!({"other": 1}))] {
            let err = update_buckets(parameters.as_ref()).unwrap_err();
            assert!(matches!(err, BrokerError::InvalidParameters(_)));
        }

        let requests = update_buckets(Some(&json!({"buckets": [{"name": ""}]}))).unwrap();
        assert_eq!(requests[0].friendly_name(), "bucket");
    }
}
