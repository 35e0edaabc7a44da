//! Layered TOML configuration for the CLI.
//!
//! User config (platform config dir) is overlaid by project config
//! (`.cohort/config.toml`), then by command-line flags. The merged result is
//! a [`cohort_core::CohortConfig`].

mod loader;
mod types;

pub use loader::ConfigLoader;
