// src/zkp/jwz.rs
//! JSON Web Zero-knowledge token packing.
//!
//! A token has the shape `base64url(header).base64url(payload).base64url(proof)`.
//! The proof is bound to the first two segments: its challenge signal is the
//! SHA-256 of `header.payload` reduced into the scalar field.

use crate::circuits::AUTH_CIRCUIT_ID;
use crate::error::ZkpError;
use crate::models::authorization::MEDIA_TYPE_ZKP;
use crate::utils::crypto::hash_to_field;
use crate::utils::serialization;
use crate::zkp::proof_generation::AuthProof;
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

pub const GROTH16_ALG: &str = "groth16";

/// Token header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JwzHeader {
    pub alg: String,
    #[serde(rename = "circuitId")]
    pub circuit_id: String,
    pub crit: Vec<String>,
    pub typ: String,
}

impl Default for JwzHeader {
    fn default() -> Self {
        Self {
            alg: GROTH16_ALG.into(),
            circuit_id: AUTH_CIRCUIT_ID.into(),
            crit: vec!["circuitId".into()],
            typ: MEDIA_TYPE_ZKP.into(),
        }
    }
}

/// Proof segment of a token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZkProof {
    /// Base64 compressed Groth16 proof
    pub proof: String,
    /// `[userId, challenge]` as decimal strings
    pub pub_signals: Vec<String>,
}

/// Header and payload encoded, waiting for a proof.
#[derive(Debug, Clone)]
pub struct UnsignedToken {
    header_b64: String,
    payload_b64: String,
}

impl UnsignedToken {
    pub fn new(header: &JwzHeader, payload: &[u8]) -> Result<Self, ZkpError> {
        let header = serialization::serialize(header)
            .map_err(|e| ZkpError::MalformedToken(e.to_string()))?;
        Ok(Self {
            header_b64: encode_segment(header.as_bytes()),
            payload_b64: encode_segment(payload),
        })
    }

    /// The value the proof must carry as its challenge signal.
    pub fn challenge(&self) -> Fr {
        challenge_for(&self.header_b64, &self.payload_b64)
    }

    /// Appends the proof segment and returns the compact token.
    pub fn finish(self, proof: &AuthProof) -> Result<String, ZkpError> {
        if proof.challenge != self.challenge() {
            return Err(ZkpError::MalformedToken(
                "proof is bound to a different challenge".into(),
            ));
        }
        let segment = ZkProof {
            proof: proof.proof_base64()?,
            pub_signals: proof.pub_signals(),
        };
        let segment = serde_json::to_vec(&segment)
            .map_err(|e| ZkpError::MalformedToken(e.to_string()))?;
        Ok(format!(
            "{}.{}.{}",
            self.header_b64,
            self.payload_b64,
            encode_segment(&segment)
        ))
    }
}

/// A token split into its decoded parts.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub header: JwzHeader,
    pub payload: Vec<u8>,
    pub proof: ZkProof,
    /// Challenge recomputed from the received header and payload segments
    pub challenge: Fr,
}

/// Splits and decodes a compact token. Does not verify the proof.
pub fn parse(token: &str) -> Result<ParsedToken, ZkpError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, proof_b64] = segments.as_slice() else {
        return Err(ZkpError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header_json = decode_segment("header", header_b64)?;
    let header: JwzHeader = serde_json::from_slice(&header_json)
        .map_err(|e| ZkpError::MalformedToken(format!("header: {e}")))?;
    let payload = decode_segment("payload", payload_b64)?;
    let proof_json = decode_segment("proof", proof_b64)?;
    let proof: ZkProof = serde_json::from_slice(&proof_json)
        .map_err(|e| ZkpError::MalformedToken(format!("proof: {e}")))?;

    Ok(ParsedToken {
        header,
        payload,
        proof,
        challenge: challenge_for(header_b64, payload_b64),
    })
}

fn challenge_for(header_b64: &str, payload_b64: &str) -> Fr {
    hash_to_field(&[header_b64.as_bytes(), b".", payload_b64.as_bytes()])
}

fn encode_segment(bytes: &[u8]) -> String {
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, ZkpError> {
    base64::decode_config(segment, base64::URL_SAFE_NO_PAD)
        .map_err(|e| ZkpError::MalformedToken(format!("{name}: {e}")))
}
