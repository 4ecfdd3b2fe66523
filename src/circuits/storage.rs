// src/circuits/storage.rs
//! Persistent cache of circuit artifacts.

use crate::circuits::{ArtifactKind, CircuitData};
use crate::error::StorageError;
use crate::storage::KeyValueStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct CircuitStorage {
    store: Arc<dyn KeyValueStore>,
}

impl CircuitStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(circuit_id: &str, kind: ArtifactKind) -> String {
        format!("circuits:{}:{}", circuit_id, kind.name())
    }

    /// Loads the cached triple. A partially cached triple counts as a miss.
    pub fn load(&self, circuit_id: &str) -> Result<Option<CircuitData>, StorageError> {
        let get = |kind| self.store.get(&Self::key(circuit_id, kind));
        let (Some(parameters), Some(proving_key), Some(verification_key)) = (
            get(ArtifactKind::Parameters)?,
            get(ArtifactKind::ProvingKey)?,
            get(ArtifactKind::VerificationKey)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(CircuitData {
            circuit_id: circuit_id.to_string(),
            parameters,
            proving_key,
            verification_key,
        }))
    }

    /// Persists all three artifacts.
    pub fn save(&self, data: &CircuitData) -> Result<(), StorageError> {
        let id = &data.circuit_id;
        self.store
            .set(&Self::key(id, ArtifactKind::Parameters), &data.parameters)?;
        self.store
            .set(&Self::key(id, ArtifactKind::ProvingKey), &data.proving_key)?;
        self.store.set(
            &Self::key(id, ArtifactKind::VerificationKey),
            &data.verification_key,
        )
    }

    /// Drops the cached triple, e.g. after it failed to decode.
    pub fn evict(&self, circuit_id: &str) -> Result<(), StorageError> {
        for kind in ArtifactKind::ALL {
            self.store.remove(&Self::key(circuit_id, kind))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn sample() -> CircuitData {
        CircuitData {
            circuit_id: "authV2".into(),
            parameters: vec![1],
            proving_key: vec![2, 2],
            verification_key: vec![3, 3, 3],
        }
    }

    #[test]
    fn test_save_load_evict() {
        let memory = MemoryStore::new();
        let storage = CircuitStorage::new(Arc::new(memory.clone()));

        assert_eq!(storage.load("authV2").unwrap(), None);
        storage.save(&sample()).unwrap();
        assert_eq!(storage.load("authV2").unwrap(), Some(sample()));
        assert!(memory.get("circuits:authV2:proving_key").unwrap().is_some());

        storage.evict("authV2").unwrap();
        assert_eq!(storage.load("authV2").unwrap(), None);
        assert!(memory.is_empty());
    }

    #[test]
    fn test_partial_triple_is_a_miss() {
        let memory = MemoryStore::new();
        let storage = CircuitStorage::new(Arc::new(memory.clone()));
        storage.save(&sample()).unwrap();
        memory.remove("circuits:authV2:verification_key").unwrap();

        assert_eq!(storage.load("authV2").unwrap(), None);
    }
}
