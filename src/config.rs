// src/config.rs
//! Runtime configuration.
//!
//! Loading order (later sources override earlier ones):
//! 1. Built-in defaults
//! 2. Optional `quorum.{toml,yaml,json}` in the working directory (or the path in `QUORUM_CONFIG`)
//! 3. `QUORUM__<SECTION>__<KEY>` environment variables, e.g. `QUORUM__SERVER__PORT=9000`
//!
//! A `.env` file is read into the environment first, if present.

use crate::models::did::DidOptions;
use config::{Config, ConfigError, Environment, File};
use log::info;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub circuits: CircuitSettings,
    pub identity: IdentitySettings,
    pub issuer: IssuerSettings,
    pub verifier: VerifierSettings,
    pub server: ServerSettings,
}

/// Where wallet state is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for the file store; ignored when `in_memory` is set
    pub dir: PathBuf,
    pub in_memory: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".quorum/wallet"),
            in_memory: false,
        }
    }
}

/// Artifact host and file ids of the auth circuit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitSettings {
    pub base_url: String,
    pub circuit_id: String,
    pub parameters_file: String,
    pub proving_key_file: String,
    pub verification_key_file: String,
    pub timeout_secs: u64,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/circuits".into(),
            circuit_id: crate::circuits::AUTH_CIRCUIT_ID.into(),
            parameters_file: "authV2.params".into(),
            proving_key_file: "authV2.zkey".into(),
            verification_key_file: "authV2.vkey".into(),
            timeout_secs: 120,
        }
    }
}

impl CircuitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub did: DidOptions,
    /// Credential status service advertised for new identities
    pub revocation_url: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            did: DidOptions::default(),
            revocation_url: "https://rhs-staging.polygonid.me".into(),
        }
    }
}

/// Issuer node the wallet requests its credential from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IssuerSettings {
    pub url: String,
    pub issuer_did: String,
    pub username: String,
    pub password: String,
    pub credential_schema: String,
    pub credential_type: String,
    pub nationality: String,
    /// Unix timestamp the issued credential expires at
    pub expiration: i64,
    pub timeout_secs: u64,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3001".into(),
            issuer_did: "did:polygonid:polygon:amoy:2qXpxUxiJXdPBBP9jbjK6skPAkVywCbPmv5Ro6aPtp".into(),
            username: "user-issuer".into(),
            password: String::new(),
            credential_schema: "ipfs://QmRKRs2hsV9TRtRevW31DmoKrLssbv6iwwzxdcA7VDhpFU".into(),
            credential_type: "test".into(),
            nationality: "FIN".into(),
            expiration: 1_903_357_766,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3002".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API cross-origin, e.g. the Quorum
    /// front end. Empty means no cross-origin access at all.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings from file and environment on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file = std::env::var("QUORUM_CONFIG").unwrap_or_else(|_| "quorum".into());
        let settings: Self = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("QUORUM")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the wallet cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.circuits.base_url.trim().is_empty() {
            return Err(ConfigError::Message("circuits.base_url must be set".into()));
        }
        if self.circuits.circuit_id.trim().is_empty() {
            return Err(ConfigError::Message("circuits.circuit_id must be set".into()));
        }
        if self.circuits.timeout_secs == 0 {
            return Err(ConfigError::Message("circuits.timeout_secs must be positive".into()));
        }
        self.identity
            .did
            .validate()
            .map_err(|e| ConfigError::Message(format!("identity.did: {e}")))?;
        for origin in &self.server.allowed_origins {
            let scheme_ok = origin.starts_with("http://") || origin.starts_with("https://");
            if !scheme_ok || origin.ends_with('/') {
                return Err(ConfigError::Message(format!(
                    "server.allowed_origins: '{origin}' is not an origin like https://host:port"
                )));
            }
        }
        Ok(())
    }

    /// Bind address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Logs a configuration summary. Never logs secrets.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        if self.storage.in_memory {
            info!("  storage: in-memory");
        } else {
            info!("  storage: {}", self.storage.dir.display());
        }
        info!(
            "  circuits: {} from {}",
            self.circuits.circuit_id, self.circuits.base_url
        );
        info!(
            "  identity: did:{}:{}:{}",
            self.identity.did.method, self.identity.did.blockchain, self.identity.did.network
        );
        info!("  issuer: {}", self.issuer.url);
        info!("  verifier: {}", self.verifier.url);
        info!("  server: {}", self.bind_addr());
        if !self.server.allowed_origins.is_empty() {
            info!("  allowed origins: {}", self.server.allowed_origins.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.circuits.circuit_id, "authV2");
        assert_eq!(settings.circuits.timeout(), Duration::from_secs(120));
        assert_eq!(settings.issuer.nationality, "FIN");
        assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let settings: Settings = Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("identity.did.network", "main")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.identity.did.network, "main");
        assert_eq!(settings.identity.did.method, "polygonid");
        settings.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_network() {
        let mut settings = Settings::default();
        settings.identity.did.network = "atlantis".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_allowed_origins_must_be_explicit() {
        let mut settings = Settings::default();
        assert!(settings.server.allowed_origins.is_empty());

        settings.server.allowed_origins = vec!["http://localhost:3000".into()];
        settings.validate().unwrap();

        settings.server.allowed_origins = vec!["*".into()];
        assert!(settings.validate().is_err());
    }
}
