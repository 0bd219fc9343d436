use common::policy;

use super::{Broker, BrokerError};

impl Broker {
    /// Find the instance group whose policy lists `bucket_name`.
    ///
    /// Walks the group listing page by page, continuing after the last
    ///  group id of each page. The scan ends at the first match, at an
    ///  empty page, or after `max_group_pages` pages, whichever comes first;
    ///  the backend running out of pages is the only natural end when no
    ///  group owns the bucket.
    #[tracing::instrument(skip(self))]
    pub async fn find_group_owning_bucket(&self, bucket_name: &str) -> Result<String, BrokerError> {
        let mut marker: Option<String> = None;

        for page in 0..self.settings.max_group_pages {
            let groups = self.admin.list_groups(marker.as_deref()).await?;
            let Some(last) = groups.last() else {
                break;
            };

            for group in &groups {
                let names = match policy::bucket_names(group) {
                    Ok(names) => names,
                    Err(e) => {
                        tracing::warn!(group = %group.display_name, error = %e, "skipping group with unreadable policy");
                        continue;
                    }
                };
                if names.iter().any(|name| name == bucket_name) {
                    tracing::debug!(group = %group.display_name, page, "found owning group");
                    return Ok(group.display_name.clone());
                }
            }

            marker = Some(last.id.clone());
            if page + 1 == self.settings.max_group_pages {
                tracing::warn!(
                    bucket = bucket_name,
                    pages = self.settings.max_group_pages,
                    "group scan stopped at page limit"
                );
            }
        }

        Err(BrokerError::NotFound(format!("group owning bucket {}", bucket_name)))
    }
}
