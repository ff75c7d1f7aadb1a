//! Directory-backed key-value store.
//!
//! Each key is a `<key>.json` file inside one data directory. Writes go to a
//! sibling `.tmp` file first and are renamed into place, so a crash mid-write
//! leaves the previous value readable.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use ticketera_core::error::StorageError;
use ticketera_core::storage::KeyValueStore;
use tracing::debug;

/// Key-value store keeping one JSON file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Directory holding the key files
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!(
                "key {key:?} is not a valid file name"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(key, e))?;
        debug!(key, bytes = value.len(), "Wrote key");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use ticketera_core::storage::USERS_KEY;

    fn create_test_store() -> (FileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();
        (store, dir)
    }

    #[test]
    fn open_creates_directory() {
        let (store, _dir) = create_test_store();
        assert!(store.root().is_dir());
    }

    #[test]
    fn set_then_get() {
        let (store, _dir) = create_test_store();
        assert!(store.get(USERS_KEY).unwrap().is_none());

        store.set(USERS_KEY, "[]").unwrap();
        assert_eq!(store.get(USERS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.root().join("ticketera_usuarios.json").is_file());
        assert!(!store.root().join("ticketera_usuarios.json.tmp").exists());

        store.set(USERS_KEY, "[1]").unwrap();
        assert_eq!(store.get(USERS_KEY).unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn remove_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.set(USERS_KEY, "[]").unwrap();
        store.remove(USERS_KEY).unwrap();
        store.remove(USERS_KEY).unwrap();
        assert!(store.get(USERS_KEY).unwrap().is_none());
    }

    #[test]
    fn rejects_path_like_keys() {
        let (store, _dir) = create_test_store();
        for key in ["", "../escape", "a/b", "dot.ted"] {
            assert!(
                matches!(store.set(key, "x"), Err(StorageError::Unavailable(_))),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        FileStore::open(dir.path()).unwrap().set("k", "v").unwrap();
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }
}
