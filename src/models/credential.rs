// src/models/credential.rs
//! Verifiable Credential data model implementation.
//!
//! Defines the W3C credential shape used by iden3 issuers
//! (see the [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/)).
//! Fields the wallet does not interpret (status, schema, proofs) are kept as
//! raw JSON so a stored credential round-trips byte-for-byte in meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Verifiable Credential according to W3C standards.
///
/// # Fields
/// - `id`: Unique identifier URI for the credential
/// - `issuer`: DID of the issuing entity
/// - `credential_subject`: claims about the holder; `id` is the holder DID
/// - `proof`: issuer signature / Merkle proofs, opaque to the wallet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// Unique URI identifier for the credential
    /// Example: "urn:uuid:123e4567-e89b-12d3-a456-426614174000"
    pub id: String,

    #[serde(rename = "@context", default)]
    pub context: Vec<String>,

    #[serde(rename = "type", default)]
    pub types: Vec<String>,

    /// DID of the credential issuer
    pub issuer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Credential claims; `id` holds the subject DID
    /// Example: {"id": "did:polygonid:...", "Nationality": "FIN", "Age": "34"}
    pub credential_subject: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

impl VerifiableCredential {
    /// DID of the holder the credential was issued to, if stated.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    /// Reads a subject attribute as a string.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.credential_subject.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_issuer_response_shape() {
        let raw = json!({
            "id": "https://issuer.example/v2/credentials/7f3a",
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "test"],
            "issuer": "did:polygonid:polygon:amoy:2qIssuer",
            "issuanceDate": "2024-11-10T10:00:00Z",
            "expirationDate": "2030-04-24T12:29:26Z",
            "credentialSubject": {
                "id": "did:polygonid:polygon:amoy:2qHolder",
                "Age": "34",
                "Nationality": "FIN",
                "type": "test"
            },
            "credentialStatus": {"type": "Iden3ReverseSparseMerkleTreeProof"},
            "proof": [{"type": "BJJSignature2021"}]
        });

        let credential: VerifiableCredential = serde_json::from_value(raw).unwrap();
        assert_eq!(credential.subject_id(), Some("did:polygonid:polygon:amoy:2qHolder"));
        assert_eq!(credential.attribute("Nationality"), Some(&json!("FIN")));
        assert_eq!(credential.types, vec!["VerifiableCredential", "test"]);

        let back = serde_json::to_value(&credential).unwrap();
        assert_eq!(back["issuanceDate"], "2024-11-10T10:00:00Z");
        assert_eq!(back["@context"][0], "https://www.w3.org/2018/credentials/v1");
    }
}
