//! JSON file-backed hint store.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{HintStore, StoreError};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HintFile {
    transaction_count: u64,
}

/// Stores the hint as `{"transactionCount": n}` in a single JSON file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous hint intact.
#[derive(Debug, Clone)]
pub struct FileHintStore {
    path: PathBuf,
}

impl FileHintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HintStore for FileHintStore {
    fn load_count(&self) -> Result<Option<u64>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let hint: HintFile = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corruption(format!("{}: {e}", self.path.display())))?;
        Ok(Some(hint.transaction_count))
    }

    fn store_count(&self, count: u64) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(&HintFile {
            transaction_count: count,
        })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, body)?;
        std::fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), count, "hint stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileHintStore::new(dir.path().join("hint.json"));
        assert_eq!(store.load_count().unwrap(), None);
    }

    #[test]
    fn stored_count_is_loaded_back() {
        let dir = TempDir::new().unwrap();
        let store = FileHintStore::new(dir.path().join("hint.json"));
        store.store_count(41).unwrap();
        store.store_count(42).unwrap();
        assert_eq!(store.load_count().unwrap(), Some(42));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_uses_transaction_count_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hint.json");
        FileHintStore::new(&path).store_count(7).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["transactionCount"], 7);
    }

    #[test]
    fn nested_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let store = FileHintStore::new(dir.path().join("a/b/hint.json"));
        store.store_count(1).unwrap();
        assert_eq!(store.load_count().unwrap(), Some(1));
    }

    #[test]
    fn garbage_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hint.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileHintStore::new(path).load_count(),
            Err(StoreError::Corruption(_))
        ));
    }
}
