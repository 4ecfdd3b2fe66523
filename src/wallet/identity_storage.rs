// src/wallet/identity_storage.rs
//! Identity records, keyed by DID under `identities:<did>`.

use crate::error::StorageError;
use crate::models::identity::IdentityRecord;
use crate::storage::{get_json, put_json, KeyValueStore};
use std::sync::Arc;

const PREFIX: &str = "identities:";

#[derive(Clone)]
pub struct IdentityStorage {
    store: Arc<dyn KeyValueStore>,
}

impl IdentityStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the record for `did`; a record that does not parse is an error.
    pub fn get(&self, did: &str) -> Result<Option<IdentityRecord>, StorageError> {
        get_json(self.store.as_ref(), &format!("{PREFIX}{did}"))
    }

    pub fn put(&self, record: &IdentityRecord) -> Result<(), StorageError> {
        put_json(self.store.as_ref(), &format!("{PREFIX}{}", record.did), record)
    }

    /// Every stored identity, ordered by DID.
    pub fn list(&self) -> Result<Vec<IdentityRecord>, StorageError> {
        let mut records = Vec::new();
        for key in self.store.keys_with_prefix(PREFIX)? {
            if let Some(record) = get_json(self.store.as_ref(), &key)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
