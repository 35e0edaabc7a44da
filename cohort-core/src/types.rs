//! Experiment, assignment and conversion types

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SplitError;

/// Variant every fallback path resolves to
pub const CONTROL_VARIANT: &str = "control";

/// Conversion type used when the caller does not name one
pub const DEFAULT_CONVERSION_TYPE: &str = "default";

/// A variant assignment persisted in the local store.
///
/// Written on every successful server assignment and read back as the offline
/// fallback, so a user keeps seeing the variant they were bucketed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssignment {
    /// Assigned variant name
    pub variant: String,
    /// When the assignment was received
    pub assigned_at: DateTime<Utc>,
    /// User the assignment belongs to
    pub user_id: String,
}

/// A successfully reported conversion, kept in the local audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    /// When the conversion happened
    pub timestamp: DateTime<Utc>,
    /// Value attributed to the conversion
    pub value: f64,
    /// User the conversion belongs to
    pub user_id: String,
}

/// A conversion whose send failed, queued durably for retry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedConversion {
    /// Queue entry id, used for exact removal after a successful retry
    pub id: Uuid,
    pub experiment_id: String,
    pub conversion_type: String,
    pub value: f64,
    /// When the conversion originally happened
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl FailedConversion {
    /// Queue a conversion that could not be sent
    pub fn new(
        experiment_id: impl Into<String>,
        conversion_type: impl Into<String>,
        value: f64,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            experiment_id: experiment_id.into(),
            conversion_type: conversion_type.into(),
            value,
            timestamp: Utc::now(),
            user_id: user_id.into(),
        }
    }
}

/// Lifecycle state of an experiment.
///
/// Transitions (`draft → active → {paused, completed}`, `paused → active`)
/// are enforced by the backend, not client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for ExperimentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown experiment status '{other}' (expected draft, active, paused or completed)"
            )),
        }
    }
}

/// Percentage allocation of users across variants, summing to 100
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrafficSplit(pub BTreeMap<String, u8>);

impl TrafficSplit {
    /// Distribute traffic evenly across the given variants.
    ///
    /// The remainder goes to the first variant, so three variants split
    /// 34/33/33 and the total is always 100.
    pub fn even(variants: &[String]) -> Self {
        if variants.is_empty() {
            return Self::default();
        }
        let base = (100 / variants.len()) as u8;
        let remainder = (100 % variants.len()) as u8;
        let mut map = BTreeMap::new();
        for (i, variant) in variants.iter().enumerate() {
            let share = if i == 0 { base + remainder } else { base };
            map.insert(variant.clone(), share);
        }
        Self(map)
    }

    /// Sum of all percentages
    pub fn total(&self) -> u32 {
        self.0.values().map(|v| u32::from(*v)).sum()
    }

    /// Check that the split covers exactly the given variants and sums to 100
    pub fn validate(&self, variants: &[String]) -> Result<(), SplitError> {
        let total = self.total();
        if total != 100 {
            return Err(SplitError::BadTotal(total));
        }
        let keys: BTreeSet<&str> = self.0.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = variants.iter().map(String::as_str).collect();
        if keys != expected {
            return Err(SplitError::VariantMismatch);
        }
        Ok(())
    }
}

/// An experiment definition as owned by the backend (consumed read-only here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub variants: Vec<String>,
    pub traffic_split: TrafficSplit,
    pub status: ExperimentStatus,
    /// Backend-formatted timestamp, passed through verbatim
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Payload for creating an experiment
#[derive(Debug, Clone, Serialize)]
pub struct NewExperiment {
    pub name: String,
    pub description: String,
    pub variants: Vec<String>,
    pub traffic_split: TrafficSplit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl NewExperiment {
    /// Create a definition with an even traffic split over the variants
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        variants: Vec<String>,
    ) -> Self {
        let traffic_split = TrafficSplit::even(&variants);
        Self {
            name: name.into(),
            description: description.into(),
            variants,
            traffic_split,
            status: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Replace the traffic split
    pub fn with_split(mut self, split: TrafficSplit) -> Self {
        self.traffic_split = split;
        self
    }

    /// Check the split invariant before sending
    pub fn validate(&self) -> Result<(), SplitError> {
        self.traffic_split.validate(&self.variants)
    }
}

/// Aggregated results for one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    #[serde(default)]
    pub experiment_id: String,
    pub experiment_name: String,
    pub total_assignments: u64,
    pub total_conversions: u64,
    /// Per-variant breakdown, keyed by variant name
    pub results: BTreeMap<String, VariantResults>,
}

/// Aggregated results for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResults {
    pub assignments: u64,
    pub conversions: u64,
    /// Conversion rate as a percentage (0..=100), rounded by the backend
    pub conversion_rate: f64,
    pub total_value: f64,
    pub avg_value: f64,
}

/// Maps variant names to values, with control-style fallbacks.
///
/// Lookup order: exact variant, then the explicit fallback, then whatever is
/// registered under `"control"`.
#[derive(Debug, Clone)]
pub struct VariantMap<T> {
    entries: HashMap<String, T>,
    fallback: Option<T>,
}

impl<T> Default for VariantMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VariantMap<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: None,
        }
    }

    /// Register a value for a variant
    pub fn with(mut self, variant: impl Into<String>, value: T) -> Self {
        self.entries.insert(variant.into(), value);
        self
    }

    /// Register an explicit fallback, consulted before the control entry
    pub fn or(mut self, value: T) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Pick the value for the given variant
    pub fn select(&self, variant: &str) -> Option<&T> {
        self.entries
            .get(variant)
            .or(self.fallback.as_ref())
            .or_else(|| self.entries.get(CONTROL_VARIANT))
    }
}
