use std::path::PathBuf;

use serde::Deserialize;

/// Configuration as stored in TOML files (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCohortConfig {
    #[serde(default)]
    pub api: RawApiConfig,

    #[serde(default)]
    pub identity: RawIdentityConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,
}

/// `[api]` section as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawApiConfig {
    /// Base URL of the experiments backend
    pub url: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// `[identity]` section as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawIdentityConfig {
    /// Explicit user id, overriding the derived fingerprint identity
    pub user_id: Option<String>,
}

/// `[storage]` section as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Directory for the durable stores
    pub data_dir: Option<PathBuf>,
}
