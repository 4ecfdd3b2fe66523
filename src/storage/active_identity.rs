// src/storage/active_identity.rs
//! Pointer to the identity the wallet currently acts as.
//!
//! A single JSON record `{ "did": ..., "isActive": true }` under a fixed key.
//! A record that is missing, unreadable or marked inactive all read back as
//! "no active identity"; the caller decides what to do about it.

use crate::error::StorageError;
use crate::models::identity::Account;
use crate::storage::{put_json, KeyValueStore};
use log::warn;
use std::sync::Arc;

pub const ACTIVE_IDENTITY_KEY: &str = "wallet:active-identity";

#[derive(Clone)]
pub struct ActiveIdentityStore {
    store: Arc<dyn KeyValueStore>,
}

impl ActiveIdentityStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the active account.
    ///
    /// # Returns
    /// - `Ok(Some(account))` when a readable, active record exists
    /// - `Ok(None)` when the record is absent, corrupt or inactive
    /// - `Err` only when the underlying store itself fails
    pub fn get(&self) -> Result<Option<Account>, StorageError> {
        let Some(bytes) = self.store.get(ACTIVE_IDENTITY_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Account>(&bytes) {
            Ok(account) if account.is_active && !account.did.is_empty() => Ok(Some(account)),
            Ok(account) => {
                warn!("Ignoring inactive identity pointer for {}", account.did);
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring unreadable active identity record: {}", e);
                Ok(None)
            }
        }
    }

    /// Replaces the active account record.
    pub fn set(&self, account: &Account) -> Result<(), StorageError> {
        put_json(self.store.as_ref(), ACTIVE_IDENTITY_KEY, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> (MemoryStore, ActiveIdentityStore) {
        let memory = MemoryStore::new();
        let active = ActiveIdentityStore::new(Arc::new(memory.clone()));
        (memory, active)
    }

    #[test]
    fn test_absent_record_reads_as_none() {
        let (_, active) = store();
        assert_eq!(active.get().unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (memory, active) = store();
        active
            .set(&Account::active("did:polygonid:polygon:amoy:2qHolder"))
            .unwrap();

        assert_eq!(
            active.get().unwrap().map(|a| a.did),
            Some("did:polygonid:polygon:amoy:2qHolder".to_string())
        );
        let raw = memory.get(ACTIVE_IDENTITY_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn test_corrupt_or_inactive_record_reads_as_none() {
        let (memory, active) = store();

        memory.set(ACTIVE_IDENTITY_KEY, b"{\"did\":").unwrap();
        assert_eq!(active.get().unwrap(), None);

        memory
            .set(ACTIVE_IDENTITY_KEY, br#"{"did":"did:x","isActive":false}"#)
            .unwrap();
        assert_eq!(active.get().unwrap(), None);
    }
}
