use std::fmt;

use serde::Serialize;

/// Build metadata captured by the build script
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gridbroker {} ({}, {} build, features: {}, built {})",
            self.version,
            self.repo_version,
            self.build_profile,
            self.build_features,
            self.build_timestamp
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        repo_version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
    }
}
