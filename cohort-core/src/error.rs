//! Error types for cohort-core

use thiserror::Error;

/// Top-level error type for cohort-core
#[derive(Error, Debug)]
pub enum CohortError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Traffic split error: {0}")]
    Split(#[from] SplitError),
}

/// Errors from the durable local store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the experiments backend API
///
/// Read paths (variant assignment) recover from these internally; they only
/// surface to callers on the admin operations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Backend rejected request: {0}")]
    Backend(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

/// Errors validating a traffic split against an experiment's variants
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
    #[error("Traffic split sums to {0}, expected 100")]
    BadTotal(u32),

    #[error("Traffic split keys do not match the experiment's variants")]
    VariantMismatch,
}
