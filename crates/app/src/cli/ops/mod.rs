pub mod serve;
pub mod version;

pub use serve::Serve;
pub use version::Version;
