// src/error.rs
//! Error types for the identity wallet.
//!
//! Each layer owns a small error enum; the orchestrator folds them into
//! [`WalletError`], which is what callers of the wallet see. `WalletError` is
//! `Clone` because the outcome of initialization is shared by every caller
//! that awaits it.

use thiserror::Error;

/// Failures surfaced by the wallet orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Persisted identity state exists but cannot be read back.
    #[error("failed to load identity: {0}")]
    IdentityLoad(String),

    /// A new identity could not be derived or persisted.
    #[error("failed to create identity: {0}")]
    IdentityCreation(String),

    /// A credential could not be attached to the active identity.
    #[error("failed to store credential: {0}")]
    CredentialStore(String),

    /// The inbound authorization request is malformed or uses an unsupported protocol message.
    #[error("invalid authorization request: {0}")]
    InvalidAuthorizationRequest(String),

    /// There is no active identity in this wallet.
    #[error("no active identity")]
    NoIdentity,

    /// The zero-knowledge proof could not be produced.
    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    /// Circuit artifacts could not be fetched, persisted or decoded.
    #[error("failed to fetch circuit artifacts: {0}")]
    ArtifactFetch(String),
}

impl WalletError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IdentityLoad(_) => "identity_load",
            Self::IdentityCreation(_) => "identity_creation",
            Self::CredentialStore(_) => "credential_store",
            Self::InvalidAuthorizationRequest(_) => "invalid_authorization_request",
            Self::NoIdentity => "no_identity",
            Self::ProofGeneration(_) => "proof_generation",
            Self::ArtifactFetch(_) => "artifact_fetch",
        }
    }

    /// Whether the session is unusable and the user must restart verification.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::IdentityLoad(_) | Self::IdentityCreation(_) | Self::ArtifactFetch(_)
        )
    }
}

/// Errors raised by a [`crate::storage::KeyValueStore`].
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("value under key '{key}' is corrupted: {message}")]
    Corrupted { key: String, message: String },

    #[error("failed to serialize value for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn corrupted(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupted {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while decoding the bank-ID claims payload.
#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("claims are not a valid JSON object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("id token could not be decoded: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("claim '{0}' is missing or empty")]
    Missing(&'static str),

    #[error("claim '{claim}' is malformed: {message}")]
    Malformed { claim: &'static str, message: String },
}

/// Errors raised while parsing iden3comm protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("unsupported message type '{0}'")]
    UnsupportedMessageType(String),

    #[error("field '{0}' is missing or empty")]
    MissingField(&'static str),
}

/// Errors raised by DID encoding and decoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DidError {
    #[error("unsupported DID method '{0}'")]
    UnsupportedMethod(String),

    #[error("unsupported DID network '{blockchain}:{network}'")]
    UnsupportedNetwork { blockchain: String, network: String },

    #[error("malformed DID '{0}'")]
    Malformed(String),

    #[error("DID checksum mismatch")]
    Checksum,
}

/// Errors raised by the zero-knowledge layer.
#[derive(Error, Debug)]
pub enum ZkpError {
    #[error("circuit artifact '{artifact}' is invalid: {message}")]
    InvalidArtifact {
        artifact: &'static str,
        message: String,
    },

    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] ark_relations::r1cs::SynthesisError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] ark_serialize::SerializationError),

    #[error("proof did not verify")]
    Rejected,

    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// Errors raised by the HTTP clients for the issuer and verifier services.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}
