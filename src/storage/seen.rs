// src/storage/seen.rs

//! Durable record of already-alerted incident identifiers.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// On-disk shape of the seen-incident file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SeenFile {
    #[serde(default)]
    incidents: Vec<String>,
}

/// Durable set of incident identifiers that have already been alerted on.
///
/// Inserts are visible to `has` immediately; `persist` writes the whole set
/// atomically. Identifiers are never pruned — operators reset history by
/// deleting the backing file.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    ids: HashSet<String>,
    dirty: bool,
}

impl SeenStore {
    /// Load the store from disk.
    ///
    /// A missing file is the first-run case and yields an empty set. A file
    /// that exists but cannot be parsed is a corrupt-state error: the
    /// recovery path is an operator deleting the file, never a silent reset.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: SeenFile = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::corrupt_state(&path, e))?;
                file.incidents.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(AppError::Io(e)),
        };
        Ok(Self {
            path,
            ids,
            dirty: false,
        })
    }

    /// Number of identifiers currently tracked.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Membership test against the current in-memory state.
    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Mark an identifier as alerted. Visible to `has` before any persist.
    pub fn insert(&mut self, id: impl Into<String>) {
        if self.ids.insert(id.into()) {
            self.dirty = true;
        }
    }

    /// Whether there are inserts not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the set to disk atomically (temp file, then rename).
    ///
    /// Identifiers are serialized in sorted order so the file diffs cleanly
    /// between runs.
    pub async fn persist(&mut self) -> Result<()> {
        let mut incidents: Vec<String> = self.ids.iter().cloned().collect();
        incidents.sort_unstable();
        let bytes = serde_json::to_vec_pretty(&SeenFile { incidents })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join("seen_incidents.json")
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SeenStore::load(state_path(&tmp)).await.unwrap();
        assert!(store.is_empty());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_fatal_load_error() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);
        std::fs::write(&path, "{not json").unwrap();

        let err = SeenStore::load(&path).await.unwrap_err();
        assert!(matches!(err, AppError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn wrong_shape_is_also_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);
        std::fs::write(&path, r#"{"incidents": "2024-001"}"#).unwrap();

        let err = SeenStore::load(&path).await.unwrap_err();
        assert!(matches!(err, AppError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn insert_is_visible_before_persist() {
        let tmp = TempDir::new().unwrap();
        let mut store = SeenStore::load(state_path(&tmp)).await.unwrap();

        assert!(!store.has("2024-001"));
        store.insert("2024-001");
        assert!(store.has("2024-001"));
        assert!(store.is_dirty());
    }

    #[tokio::test]
    async fn unpersisted_inserts_do_not_survive_reload() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);

        let mut store = SeenStore::load(&path).await.unwrap();
        store.insert("2024-001");
        drop(store);

        // Crash before persist: the identifier must come back as unseen so
        // the incident is re-alerted rather than lost.
        let reloaded = SeenStore::load(&path).await.unwrap();
        assert!(!reloaded.has("2024-001"));
    }

    #[tokio::test]
    async fn persist_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);

        let mut store = SeenStore::load(&path).await.unwrap();
        store.insert("2024-002");
        store.insert("2024-001");
        store.insert("2024-002");
        store.persist().await.unwrap();
        assert!(!store.is_dirty());

        let reloaded = SeenStore::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.has("2024-001"));
        assert!(reloaded.has("2024-002"));
    }

    #[tokio::test]
    async fn persisted_file_is_sorted() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);

        let mut store = SeenStore::load(&path).await.unwrap();
        store.insert("b");
        store.insert("a");
        store.insert("c");
        store.persist().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let a = content.find("\"a\"").unwrap();
        let b = content.find("\"b\"").unwrap();
        let c = content.find("\"c\"").unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn stale_temp_file_does_not_corrupt_load() {
        let tmp = TempDir::new().unwrap();
        let path = state_path(&tmp);

        let mut store = SeenStore::load(&path).await.unwrap();
        store.insert("2024-001");
        store.persist().await.unwrap();

        // Simulate a crash that died mid-write of the temp file: the real
        // file must still load with the prior complete state.
        std::fs::write(path.with_extension("tmp"), r#"{"incid"#).unwrap();
        let reloaded = SeenStore::load(&path).await.unwrap();
        assert!(reloaded.has("2024-001"));

        // And a later persist replaces the garbage temp file cleanly.
        let mut reloaded = reloaded;
        reloaded.insert("2024-002");
        reloaded.persist().await.unwrap();
        let again = SeenStore::load(&path).await.unwrap();
        assert!(again.has("2024-002"));
    }

    #[tokio::test]
    async fn persist_creates_missing_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state").join("seen_incidents.json");

        let mut store = SeenStore::load(&path).await.unwrap();
        store.insert("2024-001");
        store.persist().await.unwrap();

        assert!(path.exists());
    }
}
