//! Conversion tracking with a durable retry queue

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{CohortClient, read_envelope};
use crate::error::ApiError;
use crate::types::{ConversionEvent, FailedConversion};

impl CohortClient {
    /// Report a conversion for an experiment.
    ///
    /// Returns whether the backend accepted it. On success the event is also
    /// appended to the local audit log; on failure it is queued durably and
    /// retried later by [`CohortClient::retry_failed_conversions`]. Never
    /// returns an error.
    pub async fn track_conversion(
        &self,
        experiment_id: &str,
        conversion_type: &str,
        value: f64,
    ) -> bool {
        match self
            .send_conversion(experiment_id, conversion_type, value)
            .await
        {
            Ok(()) => {
                let event = ConversionEvent {
                    timestamp: Utc::now(),
                    value,
                    user_id: self.user_id.clone(),
                };
                if let Err(e) = self
                    .store
                    .record_conversion(experiment_id, conversion_type, event)
                    .await
                {
                    warn!(experiment_id, conversion_type, error = %e, "failed to log conversion locally");
                }
                true
            }
            Err(e) => {
                warn!(experiment_id, conversion_type, error = %e, "conversion send failed, queueing for retry");
                let failed =
                    FailedConversion::new(experiment_id, conversion_type, value, &self.user_id);
                if let Err(e) = self.store.enqueue_failed(failed).await {
                    error!(experiment_id, conversion_type, error = %e, "failed to queue conversion");
                }
                false
            }
        }
    }

    /// Report a conversion at most once per (experiment, type) pair per session.
    ///
    /// A pair that was already tracked successfully is suppressed without a
    /// network send and returns false.
    pub async fn track_conversion_once(
        &self,
        experiment_id: &str,
        conversion_type: &str,
        value: f64,
    ) -> bool {
        let key = (experiment_id.to_string(), conversion_type.to_string());
        {
            let converted = self.converted.lock().await;
            if converted.contains(&key) {
                debug!(experiment_id, conversion_type, "conversion already tracked this session");
                return false;
            }
        }

        let success = self
            .track_conversion(experiment_id, conversion_type, value)
            .await;
        if success {
            self.converted.lock().await.insert(key);
        }
        success
    }

    /// Whether this session already tracked the (experiment, type) pair
    pub async fn has_converted(&self, experiment_id: &str, conversion_type: &str) -> bool {
        let key = (experiment_id.to_string(), conversion_type.to_string());
        self.converted.lock().await.contains(&key)
    }

    /// Re-attempt every queued failed conversion, removing exactly the
    /// entries that now succeed. Returns how many were recovered.
    ///
    /// Sends go through the raw path, not [`CohortClient::track_conversion`],
    /// so an entry that fails again stays queued once instead of being
    /// re-enqueued as a duplicate.
    pub async fn retry_failed_conversions(&self) -> usize {
        let failed = self.store.failed_conversions().await;
        if failed.is_empty() {
            return 0;
        }
        info!(pending = failed.len(), "retrying failed conversions");

        let mut recovered = Vec::new();
        for conversion in failed {
            match self
                .send_conversion(
                    &conversion.experiment_id,
                    &conversion.conversion_type,
                    conversion.value,
                )
                .await
            {
                Ok(()) => {
                    let event = ConversionEvent {
                        timestamp: conversion.timestamp,
                        value: conversion.value,
                        user_id: conversion.user_id.clone(),
                    };
                    if let Err(e) = self
                        .store
                        .record_conversion(
                            &conversion.experiment_id,
                            &conversion.conversion_type,
                            event,
                        )
                        .await
                    {
                        warn!(error = %e, "failed to log retried conversion locally");
                    }
                    recovered.push(conversion.id);
                }
                Err(e) => {
                    debug!(id = %conversion.id, error = %e, "retry failed, keeping queued");
                }
            }
        }

        if !recovered.is_empty()
            && let Err(e) = self.store.remove_failed(&recovered).await
        {
            error!(error = %e, "failed to prune retry queue");
        }
        recovered.len()
    }

    /// Run the retry sweep fire-and-forget on a background task.
    ///
    /// Intended for process start in long-running hosts; it does not block
    /// startup and the handle only needs to be awaited by tests. Callers
    /// keep their own handle via `client.clone().spawn_retry_sweep()`.
    pub fn spawn_retry_sweep(self: Arc<Self>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let recovered = self.retry_failed_conversions().await;
            if recovered > 0 {
                info!(recovered, "retry sweep recovered queued conversions");
            }
            recovered
        })
    }

    async fn send_conversion(
        &self,
        experiment_id: &str,
        conversion_type: &str,
        value: f64,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "experiment_id": experiment_id,
            "conversion_type": conversion_type,
            "conversion_value": value,
            "user_id": self.user_id,
        });

        let response = self
            .http
            .post(self.url("convert"))
            .json(&body)
            .send()
            .await?;
        read_envelope(response).await?;
        Ok(())
    }
}
