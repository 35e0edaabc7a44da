//! Experiment administration: CRUD and aggregated results.
//!
//! Unlike the assignment and conversion paths, these surface their errors to
//! the caller so an operator dashboard can display them.

use serde_json::Value;

use super::{CohortClient, read_envelope};
use crate::error::ApiError;
use crate::types::{Experiment, ExperimentResults, ExperimentStatus, NewExperiment};

impl CohortClient {
    /// List experiments known to the backend
    pub async fn experiments(&self) -> Result<Vec<Experiment>, ApiError> {
        let response = self.http.get(self.url("experiments")).send().await?;
        let value = read_envelope(response).await?;

        let experiments = value
            .get("experiments")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(experiments)
            .map_err(|e| ApiError::Decode(format!("experiments list: {e}")))
    }

    /// Create an experiment, returning its backend-assigned id.
    ///
    /// The traffic-split invariant is checked locally before the request so
    /// an operator gets the precise violation instead of a generic 400.
    pub async fn create_experiment(&self, experiment: &NewExperiment) -> Result<String, ApiError> {
        experiment
            .validate()
            .map_err(|e| ApiError::Invalid(e.to_string()))?;

        let response = self
            .http
            .post(self.url("experiments"))
            .json(experiment)
            .send()
            .await?;
        let value = read_envelope(response).await?;

        value
            .get("experiment_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("create response missing experiment_id".to_string()))
    }

    /// Update an experiment's lifecycle status.
    ///
    /// Transition legality is the backend's call; an illegal transition comes
    /// back as [`ApiError::Backend`].
    pub async fn update_experiment_status(
        &self,
        experiment_id: &str,
        status: ExperimentStatus,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        let response = self
            .http
            .put(self.url(&format!("experiments/{experiment_id}/status")))
            .json(&body)
            .send()
            .await?;
        read_envelope(response).await?;
        Ok(())
    }

    /// Fetch aggregated assignment and conversion results for an experiment
    pub async fn results(&self, experiment_id: &str) -> Result<ExperimentResults, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("results/{experiment_id}")))
            .send()
            .await?;
        let value = read_envelope(response).await?;

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("experiment results: {e}")))
    }
}
