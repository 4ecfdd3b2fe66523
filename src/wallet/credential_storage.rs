// src/wallet/credential_storage.rs
//! Credential storage management for the wallet component.
//!
//! Credentials are persisted per holder DID as one JSON array under
//! `credentials:<did>`. Within a holder, a credential id appears at most once.

use crate::error::StorageError;
use crate::models::credential::VerifiableCredential;
use crate::storage::{get_json, put_json, KeyValueStore};
use std::sync::{Arc, Mutex};

/// Persistent storage for Verifiable Credentials.
///
/// Writes are read-modify-write on the holder's list; a mutex serializes them
/// so two concurrent saves cannot drop each other's credential.
#[derive(Clone)]
pub struct CredentialStorage {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn key(did: &str) -> String {
        format!("credentials:{did}")
    }

    /// Stores credentials for `did` in one write.
    ///
    /// # Behavior
    /// - Replaces an existing credential with the same id, keeping its position
    /// - Appends otherwise
    /// - Either the whole batch lands or, on a storage error, none of it does
    ///
    /// # Returns
    /// How many stored credentials were replaced by id
    pub fn store_credentials(
        &self,
        did: &str,
        batch: Vec<VerifiableCredential>,
    ) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let key = Self::key(did);
        let mut credentials = self.list_credentials(did)?;
        let mut replaced = 0;
        for credential in batch {
            match credentials.iter_mut().find(|c| c.id == credential.id) {
                Some(existing) => {
                    *existing = credential;
                    replaced += 1;
                }
                None => credentials.push(credential),
            }
        }

        put_json(self.store.as_ref(), &key, &credentials)?;
        Ok(replaced)
    }

    /// All credentials held by `did`, in insertion order.
    pub fn list_credentials(&self, did: &str) -> Result<Vec<VerifiableCredential>, StorageError> {
        Ok(get_json(self.store.as_ref(), &Self::key(did))?.unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) fn create_test_credential(id: &str, holder: &str) -> VerifiableCredential {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential", "test"],
        "issuer": "did:polygonid:polygon:amoy:2qXpxUxiJXdPBBP9jbjK6skPAkVywCbPmv5Ro6aPtp",
        "credentialSubject": {"id": holder, "Nationality": "FIN"}
    }))
    .unwrap()
}
