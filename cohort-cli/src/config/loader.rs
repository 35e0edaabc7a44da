use std::path::PathBuf;

use anyhow::Result;
use cohort_core::{CohortConfig, config::DEFAULT_TIMEOUT_MS};
use directories::ProjectDirs;

use super::types::{RawApiConfig, RawCohortConfig, RawIdentityConfig, RawStorageConfig};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + flag override)
    pub fn load(api_url_override: Option<String>) -> Result<CohortConfig> {
        let mut raw = RawCohortConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            let contents = std::fs::read_to_string(&user_path)?;
            let user_config: RawCohortConfig = toml::from_str(&contents)?;
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            let contents = std::fs::read_to_string(&project_path)?;
            let project_config: RawCohortConfig = toml::from_str(&contents)?;
            raw = Self::merge_raw(raw, project_config);
        }

        let mut config = Self::finalize(raw);

        // Layer 3: Command-line flag
        if let Some(url) = api_url_override {
            config.api_url = url;
        }

        Ok(config)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cohort").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path.
    /// Can be overridden with COHORT_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("COHORT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".cohort/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCohortConfig, overlay: RawCohortConfig) -> RawCohortConfig {
        RawCohortConfig {
            api: RawApiConfig {
                url: overlay.api.url.or(base.api.url),
                timeout_ms: overlay.api.timeout_ms.or(base.api.timeout_ms),
            },
            identity: RawIdentityConfig {
                user_id: overlay.identity.user_id.or(base.identity.user_id),
            },
            storage: RawStorageConfig {
                data_dir: overlay.storage.data_dir.or(base.storage.data_dir),
            },
        }
    }

    /// Convert to the core config with defaults applied
    fn finalize(raw: RawCohortConfig) -> CohortConfig {
        let defaults = CohortConfig::default();
        CohortConfig {
            api_url: raw.api.url.unwrap_or(defaults.api_url),
            timeout_ms: raw.api.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            user_id: raw.identity.user_id,
            data_dir: raw.storage.data_dir,
        }
    }
}
