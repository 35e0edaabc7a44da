//! The experiments backend client.
//!
//! [`CohortClient`] is an explicit object built once from a [`CohortConfig`]
//! and passed by reference to consumers; there is no module-level singleton.
//! Assignment reads degrade to local fallbacks and never fail, conversion
//! writes degrade to queue-and-retry, admin operations surface their errors.

mod admin;
mod assignment;
mod conversion;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::CohortConfig;
use crate::error::{ApiError, CohortError};
use crate::identity;
use crate::store::LocalStore;

pub use assignment::AssignOptions;

/// Client for variant assignment, conversion tracking and experiment admin
pub struct CohortClient {
    config: CohortConfig,
    http: reqwest::Client,
    user_id: String,
    store: Arc<LocalStore>,
    /// Session cache of experiment id → variant; a hit means no network call
    cache: RwLock<HashMap<String, String>>,
    /// (experiment, conversion type) pairs already tracked this session
    converted: Mutex<HashSet<(String, String)>>,
}

impl CohortClient {
    /// Build a client, loading the durable store from the configured
    /// (or default XDG) data directory
    pub async fn new(config: CohortConfig) -> Result<Self, CohortError> {
        let dir = config
            .data_dir
            .clone()
            .unwrap_or_else(cohort_paths::data_dir);
        let store = Arc::new(LocalStore::load(dir).await?);
        Self::with_store(config, store).await
    }

    /// Build a client over an already-loaded store.
    ///
    /// The identity is resolved in order: explicit config override, persisted
    /// id, freshly derived fingerprint id (which is then persisted).
    pub async fn with_store(
        config: CohortConfig,
        store: Arc<LocalStore>,
    ) -> Result<Self, CohortError> {
        let user_id = match &config.user_id {
            Some(id) => id.clone(),
            None => match store.user_id().await? {
                Some(id) => id,
                None => {
                    let id = identity::derive_user_id();
                    store.set_user_id(&id).await?;
                    id
                }
            },
        };

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            config,
            http,
            user_id,
            store,
            cache: RwLock::new(HashMap::new()),
            converted: Mutex::new(HashSet::new()),
        })
    }

    /// Stable user id all assignments and conversions are keyed by
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The durable local store backing this client
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Wipe all local state: durable files, the session variant cache and
    /// the tracked-conversion set
    pub async fn clear_local_data(&self) -> Result<(), CohortError> {
        self.store.clear().await?;
        self.cache.write().await.clear();
        self.converted.lock().await.clear();
        Ok(())
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Unwrap a backend response envelope.
///
/// Every endpoint answers `{status: "success" | "error", error?, ...}`; a 2xx
/// carrying `status: "error"` is still an error.
pub(crate) async fn read_envelope(
    response: reqwest::Response,
) -> Result<serde_json::Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Http { status, body });
    }

    let value: serde_json::Value = response.json().await?;
    match value.get("status").and_then(serde_json::Value::as_str) {
        Some("success") => Ok(value),
        _ => {
            let message = value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            Err(ApiError::Backend(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_user_id_overrides_derived() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(LocalStore::load(temp_dir.path()).await.unwrap());
        let config = CohortConfig {
            user_id: Some("override-id".to_string()),
            ..CohortConfig::default()
        };

        let client = CohortClient::with_store(config, store).await.unwrap();
        assert_eq!(client.user_id(), "override-id");
    }

    #[tokio::test]
    async fn test_derived_user_id_is_persisted_and_reused() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(LocalStore::load(temp_dir.path()).await.unwrap());

        let first = CohortClient::with_store(CohortConfig::default(), Arc::clone(&store))
            .await
            .unwrap();
        let id = first.user_id().to_string();
        assert_eq!(id.len(), identity::USER_ID_LEN);

        let second = CohortClient::with_store(CohortConfig::default(), store)
            .await
            .unwrap();
        assert_eq!(second.user_id(), id);
    }

    #[tokio::test]
    async fn test_url_joins_without_double_slash() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(LocalStore::load(temp_dir.path()).await.unwrap());
        let config = CohortConfig::new("http://localhost:5000/api/ab/");
        let client = CohortClient::with_store(config, store).await.unwrap();

        assert_eq!(
            client.url("/assign/hero-test"),
            "http://localhost:5000/api/ab/assign/hero-test"
        );
        assert_eq!(
            client.url("convert"),
            "http://localhost:5000/api/ab/convert"
        );
    }
}
