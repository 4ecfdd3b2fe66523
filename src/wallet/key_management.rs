// src/wallet/key_management.rs
//! Auth key management for the wallet.
//!
//! An identity's auth secret is a BN254 scalar derived deterministically from
//! the identity seed, so the same bank-ID subject always maps to the same
//! identity. The secret is persisted under `keys:<did>` and never leaves the
//! wallet; only its Poseidon commitment is public.

use crate::error::StorageError;
use crate::storage::KeyValueStore;
use crate::utils::crypto::hash_to_field;
use crate::utils::serialization::{from_canonical_bytes, to_canonical_bytes};
use ark_bn254::Fr;
use std::sync::Arc;

/// Domain separator for auth secret derivation.
const AUTH_SECRET_DOMAIN: &[u8] = b"quorum:auth-secret:";

/// Derives the auth secret for an identity seed.
///
/// # Arguments
/// * `seed` - Stable subject identifier bytes (the bank-ID `sub`)
pub fn derive_auth_secret(seed: &[u8]) -> Fr {
    hash_to_field(&[AUTH_SECRET_DOMAIN, seed])
}

/// Store of auth secrets keyed by DID.
#[derive(Clone)]
pub struct KeyManager {
    store: Arc<dyn KeyValueStore>,
}

impl KeyManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(did: &str) -> String {
        format!("keys:{did}")
    }

    /// Persists `secret` as the auth key of `did`.
    pub fn store_secret(&self, did: &str, secret: &Fr) -> Result<(), StorageError> {
        let key = Self::key(did);
        let bytes = to_canonical_bytes(secret)
            .map_err(|e| StorageError::corrupted(&key, e.to_string()))?;
        self.store.set(&key, base64::encode(bytes).as_bytes())
    }

    /// Loads the auth key of `did`.
    ///
    /// # Returns
    /// - `Ok(None)` when no key is stored
    /// - `Err(StorageError::Corrupted)` when the stored value does not decode
    pub fn load_secret(&self, did: &str) -> Result<Option<Fr>, StorageError> {
        let key = Self::key(did);
        let Some(encoded) = self.store.get(&key)? else {
            return Ok(None);
        };

        let bytes = base64::decode(&encoded)
            .map_err(|e| StorageError::corrupted(&key, e.to_string()))?;
        let secret = from_canonical_bytes(&bytes)
            .map_err(|e| StorageError::corrupted(&key, e.to_string()))?;
        Ok(Some(secret))
    }
}
