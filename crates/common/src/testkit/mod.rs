/// In-memory stand-ins for the grid's admin and storage APIs.
///
/// Both backends record every call they receive and can be told to fail
/// specific operations, which is enough to drive the broker's rollback
/// and partial failure paths without a live grid.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::{MemoryAdmin, MemoryStorage};
///
/// let admin = MemoryAdmin::new();
/// let storage = MemoryStorage::new("us-east-1");
/// storage.fail_create("data");
/// ```
mod admin;
mod storage;

pub use admin::MemoryAdmin;
pub use storage::{MemoryStorage, StorageCall};
