/**
 * Tenant administration API client.
 *  - Bearer token session against `/authorize`
 *  - Group, user and access key management
 */
pub mod admin;
/**
 * Mapping between human friendly bucket names
 *  and the globally unique names we actually
 *  create in object storage.
 */
pub mod names;
/**
 * Group policy documents. The policy attached to
 *  an instance's group is the only durable record
 *  of which buckets belong to that instance.
 */
pub mod policy;
/**
 * Time limited credentials cached behind a mutex
 *  and refreshed on demand.
 */
pub mod session;
/**
 * S3 compatible object storage client, authenticated
 *  with short lived keys minted by the admin API.
 */
pub mod storage;
/**
 * In-memory backends for exercising broker flows
 *  without a live grid.
 */
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
/**
 * Helper for reporting build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::admin::{AccessKey, AdminApi, AdminClient, AdminConfig, AdminError, Group, User};
    pub use crate::names::{normalize_id, to_friendly_name, to_full_name};
    pub use crate::policy::{Bucket, BucketSet, PolicyError};
    pub use crate::session::SessionCache;
    pub use crate::storage::{StorageApi, StorageClient, StorageConfig, StorageError};
    pub use crate::version::build_info;
}
