// src/circuits/loader.rs
//! Cache-first circuit loading.
//!
//! The artifacts are large, so they are downloaded once and persisted. On
//! every later start the cached copy is decoded; only a missing or unreadable
//! cache triggers a new download.

use crate::circuits::{CircuitData, CircuitStorage};
use crate::config::CircuitSettings;
use crate::error::WalletError;
use crate::zkp::AuthProver;
use log::{debug, info, warn};

/// Loads the prover for the configured circuit.
pub struct CircuitLoader {
    client: reqwest::Client,
    settings: CircuitSettings,
    storage: CircuitStorage,
}

impl CircuitLoader {
    /// Creates a loader with an HTTP client bounded by the configured timeout.
    pub fn new(settings: CircuitSettings, storage: CircuitStorage) -> Result<Self, WalletError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| WalletError::ArtifactFetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            storage,
        })
    }

    pub fn circuit_id(&self) -> &str {
        &self.settings.circuit_id
    }

    /// Returns a prover built from cached artifacts, fetching them first if needed.
    ///
    /// # Errors
    /// [`WalletError::ArtifactFetch`] when the download fails, when the host
    /// answers with a non-success status, when the downloaded artifacts do not
    /// decode, or when they cannot be persisted.
    pub async fn load(&self) -> Result<AuthProver, WalletError> {
        let circuit_id = self.circuit_id();

        match self.storage.load(circuit_id) {
            Ok(Some(data)) => match AuthProver::from_circuit(&data) {
                Ok(prover) => {
                    debug!("Loaded circuit {} from cache", circuit_id);
                    return Ok(prover);
                }
                Err(e) => {
                    warn!("Cached circuit {} is unreadable, refetching: {}", circuit_id, e);
                    if let Err(e) = self.storage.evict(circuit_id) {
                        warn!("Failed to evict cached circuit {}: {}", circuit_id, e);
                    }
                }
            },
            Ok(None) => debug!("Circuit {} not cached", circuit_id),
            Err(e) => warn!("Failed to read cached circuit {}: {}", circuit_id, e),
        }

        let data = self.fetch().await?;
        let prover = AuthProver::from_circuit(&data).map_err(|e| {
            WalletError::ArtifactFetch(format!("downloaded circuit {circuit_id} is invalid: {e}"))
        })?;

        self.storage.save(&data).map_err(|e| {
            WalletError::ArtifactFetch(format!("failed to persist circuit {circuit_id}: {e}"))
        })?;
        info!("Fetched and cached circuit {}", circuit_id);

        Ok(prover)
    }

    /// Downloads the three artifacts concurrently.
    pub async fn fetch(&self) -> Result<CircuitData, WalletError> {
        let (parameters, proving_key, verification_key) = futures::try_join!(
            self.fetch_file(&self.settings.parameters_file),
            self.fetch_file(&self.settings.proving_key_file),
            self.fetch_file(&self.settings.verification_key_file),
        )?;

        Ok(CircuitData {
            circuit_id: self.settings.circuit_id.clone(),
            parameters,
            proving_key,
            verification_key,
        })
    }

    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>, WalletError> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), file_id);
        debug!("Fetching circuit artifact {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::ArtifactFetch(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::ArtifactFetch(format!(
                "GET {url} returned status {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WalletError::ArtifactFetch(format!("reading {url} failed: {e}")))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::zkp::proof_generation::fixtures::circuit_data;
    use mockito::{mock, Mock};
    use std::sync::Arc;

    fn settings(prefix: &str) -> CircuitSettings {
        CircuitSettings {
            base_url: format!("{}/{}", mockito::server_url(), prefix),
            ..CircuitSettings::default()
        }
    }

    fn serve(prefix: &str, data: &CircuitData) -> Vec<Mock> {
        let defaults = CircuitSettings::default();
        [
            (&defaults.parameters_file, &data.parameters),
            (&defaults.proving_key_file, &data.proving_key),
            (&defaults.verification_key_file, &data.verification_key),
        ]
        .into_iter()
        .map(|(file, body)| {
            mock("GET", format!("/{prefix}/{file}").as_str())
                .with_status(200)
                .with_body(body)
                .expect(1)
                .create()
        })
        .collect()
    }

    #[tokio::test]
    async fn test_fetches_once_then_uses_cache() {
        let data = circuit_data();
        let mocks = serve("cache-first", &data);
        let memory = MemoryStore::new();
        let storage = CircuitStorage::new(Arc::new(memory.clone()));

        let loader = CircuitLoader::new(settings("cache-first"), storage.clone()).unwrap();
        loader.load().await.unwrap();
        assert_eq!(storage.load("authV2").unwrap(), Some(data));

        // A second loader over the same store must not hit the network.
        let loader = CircuitLoader::new(settings("cache-first"), storage).unwrap();
        loader.load().await.unwrap();

        for m in mocks {
            m.assert();
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_artifact_fetch_error() {
        let _params = mock("GET", "/missing/authV2.params").with_status(200).create();
        let _zkey = mock("GET", "/missing/authV2.zkey").with_status(404).create();
        let _vkey = mock("GET", "/missing/authV2.vkey").with_status(200).create();

        let storage = CircuitStorage::new(Arc::new(MemoryStore::new()));
        let loader = CircuitLoader::new(settings("missing"), storage.clone()).unwrap();

        let err = loader.load().await.err().unwrap();
        assert!(matches!(err, WalletError::ArtifactFetch(ref m) if m.contains("404")));
        assert_eq!(storage.load("authV2").unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_download_is_not_cached() {
        let _params = mock("GET", "/garbage/authV2.params").with_body("nope").create();
        let _zkey = mock("GET", "/garbage/authV2.zkey").with_body("nope").create();
        let _vkey = mock("GET", "/garbage/authV2.vkey").with_body("nope").create();

        let storage = CircuitStorage::new(Arc::new(MemoryStore::new()));
        let loader = CircuitLoader::new(settings("garbage"), storage.clone()).unwrap();

        assert!(matches!(
            loader.load().await,
            Err(WalletError::ArtifactFetch(_))
        ));
        assert_eq!(storage.load("authV2").unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_replaced() {
        let data = circuit_data();
        let _mocks = serve("recover", &data);
        let memory = MemoryStore::new();
        memory.set("circuits:authV2:parameters", b"junk").unwrap();
        memory.set("circuits:authV2:proving_key", b"junk").unwrap();
        memory.set("circuits:authV2:verification_key", b"junk").unwrap();

        let storage = CircuitStorage::new(Arc::new(memory));
        let loader = CircuitLoader::new(settings("recover"), storage.clone()).unwrap();
        loader.load().await.unwrap();

        assert_eq!(storage.load("authV2").unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let storage = CircuitStorage::new(Arc::new(MemoryStore::new()));
        let loader = CircuitLoader::new(
            CircuitSettings {
                base_url: "http://127.0.0.1:9/circuits".into(),
                ..CircuitSettings::default()
            },
            storage,
        )
        .unwrap();

        assert!(matches!(
            loader.fetch().await,
            Err(WalletError::ArtifactFetch(_))
        ));
    }
}
