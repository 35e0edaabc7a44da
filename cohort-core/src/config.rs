//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default experiments API base URL (local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/ab";

/// Default timeout applied to every backend request, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Configuration for a [`crate::CohortClient`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Base URL of the experiments backend, e.g. `https://example.com/api/ab`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for assignment, conversion and admin requests, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Explicit user id, overriding the derived fingerprint identity
    #[serde(default)]
    pub user_id: Option<String>,

    /// Directory for the durable stores; defaults to the XDG data dir
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_id: None,
            data_dir: None,
        }
    }
}

impl CohortConfig {
    /// Create a config pointed at the given backend base URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CohortConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.user_id.is_none());
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = CohortConfig {
            timeout_ms: 1_500,
            ..CohortConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_deserialize_toml() {
        let toml = r#"
            api_url = "https://experiments.example.com/api/ab"
            timeout_ms = 2500
            user_id = "operator-1"
        "#;
        let config: CohortConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_url, "https://experiments.example.com/api/ab");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.user_id.as_deref(), Some("operator-1"));
    }

    #[test]
    fn test_deserialize_toml_defaults() {
        let toml = r#""#;
        let config: CohortConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
