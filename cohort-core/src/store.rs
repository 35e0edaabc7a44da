//! Durable local storage for assignments and conversions.
//!
//! Everything is file-backed JSON in one directory, loaded into memory once
//! and written through on every mutation. Corrupt files degrade to empty
//! rather than failing the caller; concurrent processes race last-write-wins,
//! which is acceptable for this non-critical data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{ConversionEvent, FailedConversion, StoredAssignment};

/// Assignment map file name
const ASSIGNMENTS_FILE: &str = "assignments.json";

/// Conversion audit log file name
const CONVERSIONS_FILE: &str = "conversions.json";

/// Failed-conversion queue file name
const FAILED_FILE: &str = "failed_conversions.json";

/// Persisted user id file name
const USER_ID_FILE: &str = "user_id";

/// File-backed storage for experiment assignments and conversion events
pub struct LocalStore {
    dir: PathBuf,
    assignments: Arc<RwLock<HashMap<String, StoredAssignment>>>,
    conversions: Arc<RwLock<HashMap<String, Vec<ConversionEvent>>>>,
    failed: Arc<RwLock<Vec<FailedConversion>>>,
}

impl LocalStore {
    /// Load the store from a directory, creating empty state for missing files
    pub async fn load(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let assignments = read_json(&dir.join(ASSIGNMENTS_FILE)).await?;
        let conversions = read_json(&dir.join(CONVERSIONS_FILE)).await?;
        let failed = read_json(&dir.join(FAILED_FILE)).await?;

        Ok(Self {
            dir,
            assignments: Arc::new(RwLock::new(assignments)),
            conversions: Arc::new(RwLock::new(conversions)),
            failed: Arc::new(RwLock::new(failed)),
        })
    }

    /// Directory the store persists into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the persisted assignment for an experiment, if any
    pub async fn assignment(&self, experiment_id: &str) -> Option<StoredAssignment> {
        let assignments = self.assignments.read().await;
        assignments.get(experiment_id).cloned()
    }

    /// All persisted assignments, keyed by experiment id
    pub async fn assignments(&self) -> HashMap<String, StoredAssignment> {
        self.assignments.read().await.clone()
    }

    /// Persist an assignment for an experiment
    pub async fn record_assignment(
        &self,
        experiment_id: &str,
        assignment: StoredAssignment,
    ) -> Result<(), StoreError> {
        {
            let mut assignments = self.assignments.write().await;
            assignments.insert(experiment_id.to_string(), assignment);
        }
        let assignments = self.assignments.read().await;
        self.write_json(ASSIGNMENTS_FILE, &*assignments).await
    }

    /// Append a successfully reported conversion to the audit log
    pub async fn record_conversion(
        &self,
        experiment_id: &str,
        conversion_type: &str,
        event: ConversionEvent,
    ) -> Result<(), StoreError> {
        let key = format!("{experiment_id}_{conversion_type}");
        {
            let mut conversions = self.conversions.write().await;
            conversions.entry(key).or_default().push(event);
        }
        let conversions = self.conversions.read().await;
        self.write_json(CONVERSIONS_FILE, &*conversions).await
    }

    /// Logged conversions for an (experiment, type) pair
    pub async fn conversions(
        &self,
        experiment_id: &str,
        conversion_type: &str,
    ) -> Vec<ConversionEvent> {
        let key = format!("{experiment_id}_{conversion_type}");
        let conversions = self.conversions.read().await;
        conversions.get(&key).cloned().unwrap_or_default()
    }

    /// Queue a conversion whose send failed
    pub async fn enqueue_failed(&self, conversion: FailedConversion) -> Result<(), StoreError> {
        {
            let mut failed = self.failed.write().await;
            failed.push(conversion);
        }
        let failed = self.failed.read().await;
        self.write_json(FAILED_FILE, &*failed).await
    }

    /// All queued failed conversions, oldest first
    pub async fn failed_conversions(&self) -> Vec<FailedConversion> {
        self.failed.read().await.clone()
    }

    /// Remove queue entries by id, returning how many were removed
    pub async fn remove_failed(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        let removed = {
            let mut failed = self.failed.write().await;
            let before = failed.len();
            failed.retain(|conversion| !ids.contains(&conversion.id));
            before - failed.len()
        };
        if removed > 0 {
            let failed = self.failed.read().await;
            self.write_json(FAILED_FILE, &*failed).await?;
        }
        Ok(removed)
    }

    /// Read the persisted user id, if one exists
    pub async fn user_id(&self) -> Result<Option<String>, StoreError> {
        let path = self.dir.join(USER_ID_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let id = fs::read_to_string(&path).await?;
        let id = id.trim().to_string();
        Ok(if id.is_empty() { None } else { Some(id) })
    }

    /// Persist the user id
    pub async fn set_user_id(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        fs::write(self.dir.join(USER_ID_FILE), id).await?;
        Ok(())
    }

    /// Wipe all stored data: assignments, conversions, queue and user id
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.assignments.write().await.clear();
        self.conversions.write().await.clear();
        self.failed.write().await.clear();

        for file in [ASSIGNMENTS_FILE, CONVERSIONS_FILE, FAILED_FILE, USER_ID_FILE] {
            match fs::remove_file(self.dir.join(file)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), content).await?;
        Ok(())
    }
}

/// Read a JSON file into a collection, treating missing or corrupt files as empty
async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn assignment(variant: &str) -> StoredAssignment {
        StoredAssignment {
            variant: variant.to_string(),
            assigned_at: Utc::now(),
            user_id: "user-1".to_string(),
        }
    }

    fn conversion(value: f64) -> ConversionEvent {
        ConversionEvent {
            timestamp: Utc::now(),
            value,
            user_id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();

        assert!(store.assignment("hero-test").await.is_none());
        assert!(store.failed_conversions().await.is_empty());
        assert!(store.user_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assignment_survives_reload() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();
        store
            .record_assignment("hero-test", assignment("variant_a"))
            .await
            .unwrap();

        let reloaded = LocalStore::load(temp_dir.path()).await.unwrap();
        let stored = reloaded.assignment("hero-test").await.unwrap();
        assert_eq!(stored.variant, "variant_a");
    }

    #[tokio::test]
    async fn test_conversion_log_appends() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();
        store
            .record_conversion("hero-test", "signup", conversion(1.0))
            .await
            .unwrap();
        store
            .record_conversion("hero-test", "signup", conversion(2.5))
            .await
            .unwrap();

        let reloaded = LocalStore::load(temp_dir.path()).await.unwrap();
        let events = reloaded.conversions("hero-test", "signup").await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].value, 2.5);
        assert!(reloaded.conversions("hero-test", "default").await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_queue_remove_by_id() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();

        let first = FailedConversion::new("hero-test", "signup", 1.0, "user-1");
        let second = FailedConversion::new("hero-test", "signup", 1.0, "user-1");
        let first_id = first.id;
        store.enqueue_failed(first).await.unwrap();
        store.enqueue_failed(second).await.unwrap();

        let removed = store.remove_failed(&[first_id]).await.unwrap();
        assert_eq!(removed, 1);

        // Identical payloads must stay distinguishable
        let remaining = store.failed_conversions().await;
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, first_id);

        // Removal persists
        let reloaded = LocalStore::load(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.failed_conversions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_failed_unknown_id_is_noop() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();
        store
            .enqueue_failed(FailedConversion::new("hero-test", "default", 1.0, "user-1"))
            .await
            .unwrap();

        let removed = store.remove_failed(&[Uuid::new_v4()]).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.failed_conversions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_user_id_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();

        store.set_user_id("abc123").await.unwrap();
        assert_eq!(store.user_id().await.unwrap().as_deref(), Some("abc123"));

        let reloaded = LocalStore::load(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.user_id().await.unwrap().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_to_empty() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join(ASSIGNMENTS_FILE), "{not json").unwrap();

        let store = LocalStore::load(temp_dir.path()).await.unwrap();
        assert!(store.assignments().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_wipes_everything() {
        let temp_dir = tempdir().unwrap();
        let store = LocalStore::load(temp_dir.path()).await.unwrap();
        store
            .record_assignment("hero-test", assignment("variant_a"))
            .await
            .unwrap();
        store
            .enqueue_failed(FailedConversion::new("hero-test", "default", 1.0, "user-1"))
            .await
            .unwrap();
        store.set_user_id("abc123").await.unwrap();

        store.clear().await.unwrap();

        let reloaded = LocalStore::load(temp_dir.path()).await.unwrap();
        assert!(reloaded.assignments().await.is_empty());
        assert!(reloaded.failed_conversions().await.is_empty());
        assert!(reloaded.user_id().await.unwrap().is_none());
    }
}
