//! Service broker provisioning S3 buckets on a StorageGRID tenant.

pub mod broker;
pub mod config;
pub mod http_server;
pub mod process;
pub mod service_state;

pub use config::Config as ServiceConfig;
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use service_state::State as ServiceState;
