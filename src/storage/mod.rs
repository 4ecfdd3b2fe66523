// src/storage/mod.rs
//! Local persistence for the wallet.
//!
//! All wallet state (the active-identity pointer, identity records, private
//! keys, credentials and circuit artifacts) lives behind the [`KeyValueStore`]
//! trait, so the orchestration logic never knows whether it is talking to an
//! in-memory map or a directory on disk.
//!
//! Reads and writes are synchronous, mirroring browser local storage.

pub mod active_identity;
pub mod file_store;
pub mod memory;

use crate::error::StorageError;
use serde::{de::DeserializeOwned, Serialize};

pub use active_identity::ActiveIdentityStore;
pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Durable local key-value persistence.
///
/// Keys are free-form strings; callers namespace them with a `prefix:` segment.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Removes `key`. Returns `true` if a value was present.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Lists every key starting with `prefix`, in lexicographic order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Reads and deserializes a JSON value.
///
/// # Errors
/// Returns [`StorageError::Corrupted`] when the stored bytes are not valid JSON for `T`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::corrupted(key, e.to_string())),
        None => Ok(None),
    }
}

/// Serializes `value` to JSON and stores it under `key`.
pub fn put_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_json_helpers_round_trip_through_store() {
        let store = MemoryStore::new();
        let value = Sample {
            name: "ballot".into(),
            count: 3,
        };

        put_json(&store, "sample:1", &value).unwrap();
        let loaded: Option<Sample> = get_json(&store, "sample:1").unwrap();
        assert_eq!(loaded, Some(value));

        let missing: Option<Sample> = get_json(&store, "sample:2").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_get_json_reports_corruption() {
        let store = MemoryStore::new();
        store.set("sample:bad", b"{not json").unwrap();

        let result: Result<Option<Sample>, _> = get_json(&store, "sample:bad");
        assert!(matches!(result, Err(StorageError::Corrupted { .. })));
    }
}
