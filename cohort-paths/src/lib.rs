//! XDG Base Directory paths for cohort.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths. This matches tools like gh, docker, kubectl.

use std::path::PathBuf;

/// Get the cohort config directory.
///
/// Returns `$XDG_CONFIG_HOME/cohort` if set, otherwise `~/.config/cohort`.
/// This is where `config.toml` lives.
///
/// # Examples
///
/// ```
/// use cohort_paths::config_dir;
///
/// let config = config_dir();
/// let config_file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("cohort")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/cohort")
    } else {
        PathBuf::from(".config/cohort")
    }
}

/// Get the cohort data directory.
///
/// Returns `$XDG_DATA_HOME/cohort` if set, otherwise `~/.local/share/cohort`.
/// This is where the durable stores live: the persisted user id, the
/// assignment map, the conversion log and the failed-conversion queue.
///
/// # Examples
///
/// ```
/// use cohort_paths::data_dir;
///
/// let data = data_dir();
/// let assignments = data.join("assignments.json");
/// ```
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("cohort")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/cohort")
    } else {
        PathBuf::from(".local/share/cohort")
    }
}
