//! cohort-core: client library for A/B experiment assignment and conversion tracking
//!
//! This crate provides the pieces a host application composes:
//!
//! - **Client** - [`CohortClient`] for variant assignment, conversion tracking
//!   and experiment administration over the experiments backend API
//! - **Identity** - [`identity`] derives a stable pseudo-anonymous user id
//!   from host attributes, persisted on first use
//! - **Durable store** - [`LocalStore`] file-backed persistence for
//!   assignments, the conversion audit log and the failed-conversion queue
//! - **Types** - [`Experiment`], [`TrafficSplit`], [`ExperimentResults`] and
//!   friends, matching the backend's wire shapes
//!
//! # Quick Start
//!
//! ```no_run
//! use cohort_core::{CohortClient, CohortConfig};
//!
//! # async fn example() -> Result<(), cohort_core::CohortError> {
//! let client = CohortClient::new(CohortConfig::default()).await?;
//!
//! // Never fails: falls back to the persisted assignment, then "control"
//! let variant = client.variant("hero-test", &Default::default()).await;
//! if variant == "variant_a" {
//!     // render the new hero
//! }
//!
//! // Failed sends are queued durably and retried later
//! client.track_conversion("hero-test", "signup", 1.0).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure semantics
//!
//! Read paths (assignment) recover locally and always hand the caller a
//! usable variant string. Write paths (conversion) report success as a bool
//! and queue failures for [`CohortClient::retry_failed_conversions`]. Admin
//! operations are the exception: their errors propagate.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod store;
pub mod types;

// Re-export key types for convenience
pub use client::{AssignOptions, CohortClient};
pub use config::{CohortConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_MS};
pub use error::{ApiError, CohortError, SplitError, StoreError};
pub use store::LocalStore;
pub use types::{
    CONTROL_VARIANT, ConversionEvent, DEFAULT_CONVERSION_TYPE, Experiment, ExperimentResults,
    ExperimentStatus, FailedConversion, NewExperiment, StoredAssignment, TrafficSplit, VariantMap,
    VariantResults,
};
