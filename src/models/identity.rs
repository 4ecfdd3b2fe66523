// src/models/identity.rs
//! Identity records persisted by the wallet.

use serde::{Deserialize, Serialize};

/// Pointer to the identity the wallet currently acts as.
///
/// Stored as JSON `{ "did": "...", "isActive": true }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub did: String,
    pub is_active: bool,
}

impl Account {
    pub fn active(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            is_active: true,
        }
    }
}

/// Public state of an identity owned by this wallet.
///
/// The matching private auth secret lives in the key store, never here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Full DID string, e.g. `did:polygonid:polygon:amoy:2q...`
    pub did: String,

    /// Poseidon commitment to the auth secret, as a decimal field element.
    /// This is the `userId` public signal of every auth proof.
    pub auth_commitment: String,

    /// Credential status / revocation service advertised for this identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_url: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}
