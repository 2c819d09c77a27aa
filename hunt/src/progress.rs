//! Persisted hunt progress
//!
//! Only the cursor is stored; everything else is re-derived on resume.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProgressRecord {
    cursor: usize,
    /// Last write (unix ms)
    updated_at: i64,
}

/// JSON file holding the current waypoint index
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Open a store at `path`, creating the parent directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(?path, "Opened progress store");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved cursor, or None when nothing has been saved
    pub fn load(&self) -> Result<Option<usize>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let record: ProgressRecord = serde_json::from_str(&content)?;
        debug!(cursor = record.cursor, "ProgressStore::load");
        Ok(Some(record.cursor))
    }

    pub fn save(&self, cursor: usize) -> Result<()> {
        let record = ProgressRecord {
            cursor,
            updated_at: chrono::Utc::now().timestamp_millis(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&record)?)?;
        info!(cursor, "Progress saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Progress cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = ProgressStore::open(temp.path().join("nested").join("progress.json")).unwrap();

        assert_eq!(store.load().unwrap(), None);
        store.save(2).unwrap();
        assert_eq!(store.load().unwrap(), Some(2));
        store.save(3).unwrap();
        assert_eq!(store.load().unwrap(), Some(3));
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = ProgressStore::open(temp.path().join("progress.json")).unwrap();
        store.save(1).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        fs::write(&path, "not json").unwrap();
        let store = ProgressStore::open(&path).unwrap();
        assert!(store.load().is_err());
    }
}
