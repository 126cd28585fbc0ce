//! [`FileStorage`]: persistent backend mirrored to a JSON file.
//!
//! The file holds an array of `[key, value]` pairs in enumeration order. It is
//! read once at open and rewritten after every mutation (temp file + rename),
//! so a crash mid-write leaves the previous contents intact.

use std::fs;
use std::path::{Path, PathBuf};

use common::BackendError;
use tracing::debug;

use super::{MemoryStorage, StorageBackend};

/// Persistent, insertion-ordered key-value storage backed by a single file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    inner: MemoryStorage,
}

impl FileStorage {
    /// Open the storage file at `path`, creating an empty store if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the file exists but cannot be read or
    /// does not contain a valid pair list.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                MemoryStorage::new()
            } else {
                let pairs: Vec<(String, String)> = serde_json::from_str(&text).map_err(|e| {
                    BackendError::Io(format!("{} is not a storage file: {e}", path.display()))
                })?;
                MemoryStorage::from_entries(pairs)
            }
        } else {
            MemoryStorage::new()
        };
        debug!(path = %path.display(), keys = inner.entries().len(), "opened file storage");
        Ok(Self { path, inner })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `next` to disk, then adopt it. On failure the in-memory state
    /// still matches the file.
    fn commit(&mut self, next: MemoryStorage) -> Result<(), BackendError> {
        let text = serde_json::to_string(next.entries())
            .map_err(|e| BackendError::Io(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        self.inner = next;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut next = self.inner.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.commit(next)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), BackendError> {
        let mut next = self.inner.clone();
        if next.delete(key) {
            self.commit(next)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        self.commit(MemoryStorage::new())
    }

    fn key(&self, index: usize) -> Result<Option<String>, BackendError> {
        self.inner.key(index)
    }

    fn length(&self) -> Result<usize, BackendError> {
        self.inner.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("store.json")).unwrap();
        assert_eq!(storage.length().unwrap(), 0);
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.set_item("b", "2").unwrap();
            storage.set_item("a", "1").unwrap();
        }
        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        // Insertion order, not key order.
        assert_eq!(storage.key(0).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn remove_and_clear_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        storage.remove_item("a").unwrap();
        assert_eq!(FileStorage::open(&path).unwrap().length().unwrap(), 1);

        storage.clear().unwrap();
        assert_eq!(FileStorage::open(&path).unwrap().length().unwrap(), 0);
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let path = nested.join("store.json");
        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("a", "1").unwrap();

        // Replace the parent directory with a plain file so every write fails.
        fs::remove_dir_all(&nested).unwrap();
        fs::write(&nested, "").unwrap();

        assert!(matches!(storage.set_item("b", "2"), Err(BackendError::Io(_))));
        assert!(storage.remove_item("a").is_err());
        assert!(storage.clear().is_err());
        assert_eq!(storage.length().unwrap(), 1);
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get_item("b").unwrap(), None);
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStorage::open(&path), Err(BackendError::Io(_))));
    }
}
