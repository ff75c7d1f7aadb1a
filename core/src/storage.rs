//! Key-value persistence abstraction.
//!
//! The ledger persists two independent collections, each a JSON array stored
//! under its own key. Backends only move strings; encoding lives in the
//! helpers below so every backend stores the same bytes.
//!
//! # Implementations
//!
//! - `FileStore` (in `ticketera-ledger`): one JSON file per key in a data directory
//! - `InMemoryStore` (in `ticketera-testing`): `HashMap` for fast, deterministic tests

use crate::error::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key holding the user roster.
pub const USERS_KEY: &str = "ticketera_usuarios";

/// Key holding the ticket history.
pub const TICKETS_KEY: &str = "ticketera_tickets";

/// String key-value storage, modelled on a browser's local storage.
///
/// Writes are full overwrites of a key's value; there is no append or
/// transaction support.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`, or `None` if nothing was ever stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Loads a JSON array stored under `key`. A missing key yields `None`.
///
/// # Errors
///
/// Returns [`StorageError::Serialization`] if the stored value is not a valid
/// array of `T`, or any error from the backend.
pub fn load_collection<T, S>(store: &S, key: &str) -> Result<Option<Vec<T>>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Stores `items` as a JSON array under `key`, replacing what was there.
///
/// # Errors
///
/// Returns [`StorageError::Serialization`] if encoding fails, or any error
/// from the backend.
pub fn save_collection<T, S>(store: &S, key: &str, items: &[T]) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(items).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}
