// src/models/did.rs
//! Decentralized Identifier (DID) data model implementation.
//!
//! Implements iden3-style identifiers of the form
//!
//! ```text
//! did:<method>:<blockchain>:<network>:<base58 id>
//! ```
//!
//! where the 31-byte id is laid out as:
//!
//! ```text
//! ┌────────────┬──────────────────────────┬────────────┐
//! │ type (2 B) │ genesis (27 B)           │ checksum   │
//! │ method,net │ tail of identity state   │ (2 B, LE)  │
//! └────────────┴──────────────────────────┴────────────┘
//! ```
//!
//! The checksum is the byte sum of type and genesis, as a little-endian `u16`.

use crate::error::DidError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TYPE_LEN: usize = 2;
const GENESIS_LEN: usize = 27;
const CHECKSUM_LEN: usize = 2;
const ID_LEN: usize = TYPE_LEN + GENESIS_LEN + CHECKSUM_LEN;

/// Method, blockchain and network a DID is minted for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DidOptions {
    pub method: String,
    pub blockchain: String,
    pub network: String,
}

impl Default for DidOptions {
    fn default() -> Self {
        Self {
            method: "polygonid".into(),
            blockchain: "polygon".into(),
            network: "amoy".into(),
        }
    }
}

impl DidOptions {
    /// Checks the method and network are ones a DID can be minted for.
    pub fn validate(&self) -> Result<(), DidError> {
        self.type_bytes().map(|_| ())
    }

    fn type_bytes(&self) -> Result<[u8; TYPE_LEN], DidError> {
        let method = match self.method.as_str() {
            "iden3" => 0x01,
            "polygonid" => 0x02,
            other => return Err(DidError::UnsupportedMethod(other.to_string())),
        };
        let network = match (self.blockchain.as_str(), self.network.as_str()) {
            ("polygon", "main") => 0x11,
            ("polygon", "mumbai") => 0x12,
            ("polygon", "amoy") => 0x13,
            ("eth", "main") | ("ethereum", "main") => 0x21,
            ("eth", "sepolia") | ("ethereum", "sepolia") => 0x23,
            _ => {
                return Err(DidError::UnsupportedNetwork {
                    blockchain: self.blockchain.clone(),
                    network: self.network.clone(),
                })
            }
        };
        Ok([method, network])
    }
}

/// A parsed, checksum-validated DID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    blockchain: String,
    network: String,
    id: [u8; ID_LEN],
}

impl Did {
    /// Derives the DID for an identity whose state is `state_le`
    /// (32 bytes, little-endian field element encoding).
    pub fn from_state(options: &DidOptions, state_le: &[u8; 32]) -> Result<Self, DidError> {
        let typ = options.type_bytes()?;

        let mut id = [0u8; ID_LEN];
        id[..TYPE_LEN].copy_from_slice(&typ);
        id[TYPE_LEN..TYPE_LEN + GENESIS_LEN].copy_from_slice(&state_le[32 - GENESIS_LEN..]);
        let checksum = checksum(&id[..TYPE_LEN + GENESIS_LEN]);
        id[TYPE_LEN + GENESIS_LEN..].copy_from_slice(&checksum.to_le_bytes());

        Ok(Self {
            method: options.method.clone(),
            blockchain: options.blockchain.clone(),
            network: options.network.clone(),
            id,
        })
    }

    /// Parses and validates a DID string.
    pub fn parse(did: &str) -> Result<Self, DidError> {
        let parts: Vec<&str> = did.split(':').collect();
        let [scheme, method, blockchain, network, encoded] = parts.as_slice() else {
            return Err(DidError::Malformed(did.to_string()));
        };
        if *scheme != "did" {
            return Err(DidError::Malformed(did.to_string()));
        }

        let options = DidOptions {
            method: method.to_string(),
            blockchain: blockchain.to_string(),
            network: network.to_string(),
        };
        let expected_type = options.type_bytes()?;

        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| DidError::Malformed(did.to_string()))?;
        let id: [u8; ID_LEN] = bytes
            .try_into()
            .map_err(|_| DidError::Malformed(did.to_string()))?;

        if id[..TYPE_LEN] != expected_type {
            return Err(DidError::Malformed(did.to_string()));
        }
        let stored = u16::from_le_bytes([id[ID_LEN - 2], id[ID_LEN - 1]]);
        if stored != checksum(&id[..TYPE_LEN + GENESIS_LEN]) {
            return Err(DidError::Checksum);
        }

        Ok(Self {
            method: options.method,
            blockchain: options.blockchain,
            network: options.network,
            id,
        })
    }

    pub fn options(&self) -> DidOptions {
        DidOptions {
            method: self.method.clone(),
            blockchain: self.blockchain.clone(),
            network: self.network.clone(),
        }
    }

    /// The base58 method-specific identifier.
    pub fn id_base58(&self) -> String {
        bs58::encode(&self.id).into_string()
    }

    /// The 27 genesis bytes embedded in the id.
    pub fn genesis(&self) -> &[u8] {
        &self.id[TYPE_LEN..TYPE_LEN + GENESIS_LEN]
    }
}

fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "did:{}:{}:{}:{}",
            self.method,
            self.blockchain,
            self.network,
            self.id_base58()
        )
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> [u8; 32] {
        let mut state = [0u8; 32];
        for (i, b) in state.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        state
    }

    #[test]
    fn test_from_state_formats_method_and_network() {
        let did = Did::from_state(&DidOptions::default(), &sample_state()).unwrap();
        let text = did.to_string();

        assert!(text.starts_with("did:polygonid:polygon:amoy:"));
        assert_eq!(did.genesis(), &sample_state()[5..]);
        assert_eq!(Did::parse(&text).unwrap(), did);
    }

    #[test]
    fn test_parse_rejects_tampered_checksum() {
        let did = Did::from_state(&DidOptions::default(), &sample_state()).unwrap();
        let mut id = did.id;
        id[ID_LEN - 1] ^= 0xff;
        let tampered = format!("did:polygonid:polygon:amoy:{}", bs58::encode(id).into_string());

        assert_eq!(Did::parse(&tampered), Err(DidError::Checksum));
    }

    #[test]
    fn test_parse_rejects_wrong_network_for_id() {
        let did = Did::from_state(&DidOptions::default(), &sample_state()).unwrap();
        let moved = format!("did:polygonid:polygon:main:{}", did.id_base58());

        assert!(matches!(Did::parse(&moved), Err(DidError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Did::parse("did:example:123").is_err());
        assert!(Did::parse("not-a-did").is_err());
        assert!(Did::parse("did:polygonid:polygon:amoy:0OIl").is_err());
    }

    #[test]
    fn test_unsupported_network() {
        let options = DidOptions {
            network: "nowhere".into(),
            ..DidOptions::default()
        };
        assert!(matches!(
            Did::from_state(&options, &sample_state()),
            Err(DidError::UnsupportedNetwork { .. })
        ));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let did = Did::from_state(&DidOptions::default(), &sample_state()).unwrap();
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, format!("\"{}\"", did));
        let back: Did = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
    }
}
