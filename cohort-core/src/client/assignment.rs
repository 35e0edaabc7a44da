//! Variant assignment with cache and local fallback

use std::collections::HashMap;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::{CohortClient, read_envelope};
use crate::error::ApiError;
use crate::types::{CONTROL_VARIANT, StoredAssignment, VariantMap};

/// Options for a variant assignment request
#[derive(Debug, Clone, Default)]
pub struct AssignOptions {
    /// Bypass the session cache and re-request from the backend
    pub force_refresh: bool,
    /// Extra attributes forwarded in the assignment request body
    pub attributes: HashMap<String, Value>,
}

impl CohortClient {
    /// Get the assigned variant for an experiment.
    ///
    /// Infallible by design: a cache hit returns without a network call,
    /// otherwise the backend is asked and the result cached in memory and
    /// durably. On any failure the persisted assignment is used, and failing
    /// that the literal `"control"`. Errors are logged, never returned.
    pub async fn variant(&self, experiment_id: &str, options: &AssignOptions) -> String {
        if !options.force_refresh
            && let Some(cached) = self.cache.read().await.get(experiment_id)
        {
            return cached.clone();
        }

        match self.request_assignment(experiment_id, options).await {
            Ok(variant) => {
                self.cache
                    .write()
                    .await
                    .insert(experiment_id.to_string(), variant.clone());

                let record = StoredAssignment {
                    variant: variant.clone(),
                    assigned_at: Utc::now(),
                    user_id: self.user_id.clone(),
                };
                if let Err(e) = self.store.record_assignment(experiment_id, record).await {
                    warn!(experiment_id, error = %e, "failed to persist assignment");
                }
                variant
            }
            Err(e) => {
                warn!(experiment_id, error = %e, "assignment request failed, falling back");
                match self.store.assignment(experiment_id).await {
                    Some(stored) => {
                        debug!(experiment_id, variant = %stored.variant, "using persisted assignment");
                        stored.variant
                    }
                    None => CONTROL_VARIANT.to_string(),
                }
            }
        }
    }

    /// Get variants for several experiments concurrently.
    ///
    /// Fan-out/fan-in: all requests are issued at once and each experiment
    /// falls back individually, so one offline experiment does not affect
    /// the others.
    pub async fn variants(&self, experiment_ids: &[&str]) -> HashMap<String, String> {
        let options = AssignOptions::default();
        let requests = experiment_ids.iter().map(|id| {
            let options = &options;
            async move { (id.to_string(), self.variant(id, options).await) }
        });
        join_all(requests).await.into_iter().collect()
    }

    /// Resolve the experiment's variant and pick the matching value from the map
    pub async fn select<'a, T>(
        &self,
        experiment_id: &str,
        map: &'a VariantMap<T>,
    ) -> Option<&'a T> {
        let variant = self.variant(experiment_id, &AssignOptions::default()).await;
        map.select(&variant)
    }

    /// Resolve the experiment's variant and run the closure with it
    pub async fn for_variant<T, F>(&self, experiment_id: &str, f: F) -> T
    where
        F: FnOnce(&str) -> T,
    {
        let variant = self.variant(experiment_id, &AssignOptions::default()).await;
        f(&variant)
    }

    async fn request_assignment(
        &self,
        experiment_id: &str,
        options: &AssignOptions,
    ) -> Result<String, ApiError> {
        let mut body = serde_json::Map::new();
        body.insert("user_id".to_string(), Value::String(self.user_id.clone()));
        for (key, value) in &options.attributes {
            body.insert(key.clone(), value.clone());
        }

        let response = self
            .http
            .post(self.url(&format!("assign/{experiment_id}")))
            .json(&body)
            .send()
            .await?;
        let value = read_envelope(response).await?;

        value
            .get("variant")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("assignment response missing variant".to_string()))
    }
}
