//! In-memory storage testing utilities
//!
//! Provides fast, deterministic stand-ins for persisted storage:
//! - [`InMemoryStore`]: `HashMap`-based key-value storage
//! - [`FailingStore`]: wraps another store and fails writes on demand

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use ticketera_core::error::StorageError;
use ticketera_core::storage::KeyValueStore;

/// In-memory key-value store for fast, deterministic testing.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the ledger owns another.
///
/// # Example
///
/// ```
/// use ticketera_testing::InMemoryStore;
/// use ticketera_core::storage::KeyValueStore;
///
/// let store = InMemoryStore::new();
/// store.set("ticketera_usuarios", "[]").unwrap();
/// assert_eq!(store.get("ticketera_usuarios").unwrap().as_deref(), Some("[]"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw values
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.write().unwrap();
            for (key, value) in entries {
                data.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    /// Raw value under `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Check if a key exists in the store
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().unwrap().contains_key(key)
    }

    /// Number of successful `set` calls so far
    ///
    /// Useful for asserting that an operation persisted (or did not).
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Clear all data (for test isolation)
    pub fn clear(&self) {
        self.data.write().unwrap().clear();
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().unwrap().remove(key);
        Ok(())
    }
}

/// Store whose writes can be switched to fail, for persistence-failure tests.
///
/// Reads always go through to the wrapped [`InMemoryStore`].
#[derive(Clone, Debug, Default)]
pub struct FailingStore {
    inner: InMemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl FailingStore {
    /// Wrap `inner`; writes succeed until [`FailingStore::fail_writes`] is called
    #[must_use]
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Let writes succeed again
    pub fn recover(&self) {
        self.fail_writes.store(false, Ordering::SeqCst);
    }

    /// The wrapped store
    #[must_use]
    pub const fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated write failure".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_data() {
        let store = InMemoryStore::new();
        let handle = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(handle.raw("k").as_deref(), Some("v"));
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.remove("nothing").is_ok());
        assert!(!store.contains_key("nothing"));
    }

    #[test]
    fn failing_store_toggles() {
        let store = FailingStore::new(InMemoryStore::new());
        store.set("k", "1").unwrap();

        store.fail_writes();
        assert!(store.set("k", "2").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1"));

        store.recover();
        store.set("k", "3").unwrap();
        assert_eq!(store.inner().raw("k").as_deref(), Some("3"));
    }
}
