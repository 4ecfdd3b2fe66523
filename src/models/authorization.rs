// src/models/authorization.rs
//! iden3comm authorization protocol messages.
//!
//! A verifier asks the wallet to prove control of its DID with an
//! *authorization request*; the wallet answers with an *authorization
//! response* packed into a zero-knowledge token. Only the plain-JSON packing
//! of requests is accepted.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUTHORIZATION_REQUEST_TYPE: &str =
    "https://iden3-communication.io/authorization/1.0/request";
pub const AUTHORIZATION_RESPONSE_TYPE: &str =
    "https://iden3-communication.io/authorization/1.0/response";
pub const MEDIA_TYPE_PLAIN: &str = "application/iden3comm-plain-json";
pub const MEDIA_TYPE_ZKP: &str = "application/iden3-zkp-json";

/// Inbound request from a verifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorizationRequest {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thid: Option<String>,

    pub from: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    pub body: AuthorizationRequestBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequestBody {
    pub callback_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub scope: Vec<ProofRequest>,
}

/// A credential query the verifier wants proven alongside authentication.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub id: u64,
    pub circuit_id: String,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub query: Value,
}

impl AuthorizationRequest {
    /// Parses raw request bytes.
    ///
    /// # Errors
    /// - [`ProtocolError::Malformed`] for anything that is not a request-shaped JSON object
    /// - [`ProtocolError::UnsupportedMediaType`] for packed (non plain-JSON) messages
    /// - [`ProtocolError::UnsupportedMessageType`] for any other iden3comm message
    /// - [`ProtocolError::MissingField`] when `id`, `from` or the callback URL are empty
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let request: Self = serde_json::from_slice(bytes)?;

        if let Some(typ) = request.typ.as_deref() {
            if typ != MEDIA_TYPE_PLAIN {
                return Err(ProtocolError::UnsupportedMediaType(typ.to_string()));
            }
        }
        if request.message_type != AUTHORIZATION_REQUEST_TYPE {
            return Err(ProtocolError::UnsupportedMessageType(
                request.message_type.clone(),
            ));
        }
        if request.id.trim().is_empty() {
            return Err(ProtocolError::MissingField("id"));
        }
        if request.from.trim().is_empty() {
            return Err(ProtocolError::MissingField("from"));
        }
        if request.body.callback_url.trim().is_empty() {
            return Err(ProtocolError::MissingField("body.callbackUrl"));
        }
        Ok(request)
    }

    /// Thread id the response must carry.
    pub fn thread_id(&self) -> &str {
        self.thid.as_deref().unwrap_or(&self.id)
    }
}

/// Outbound response, the payload of the zero-knowledge token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorizationResponse {
    pub id: String,
    pub typ: String,

    #[serde(rename = "type")]
    pub message_type: String,

    pub thid: String,
    pub from: String,
    pub to: String,
    pub body: AuthorizationResponseBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorizationResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub scope: Vec<Value>,
}

impl AuthorizationResponse {
    /// Builds the response to `request` on behalf of `holder_did`.
    pub fn for_request(request: &AuthorizationRequest, holder_did: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            typ: MEDIA_TYPE_ZKP.to_string(),
            message_type: AUTHORIZATION_RESPONSE_TYPE.to_string(),
            thid: request.thread_id().to_string(),
            from: holder_did.to_string(),
            to: request.from.clone(),
            body: AuthorizationResponseBody {
                message: request.body.message.clone(),
                scope: Vec::new(),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_request() {
        let bytes = fixtures::auth_request("https://verifier.example/callback?sessionId=1");
        let request = AuthorizationRequest::parse(&bytes).unwrap();

        assert_eq!(request.body.callback_url, "https://verifier.example/callback?sessionId=1");
        assert_eq!(request.thread_id(), "f8aee09d-f592-4fcc-8d2a-8938aa26676c");
        assert!(request.body.scope.is_empty());
    }

    #[test]
    fn test_parse_scope_entries() {
        let bytes = serde_json::to_vec(&json!({
            "id": "1",
            "type": AUTHORIZATION_REQUEST_TYPE,
            "from": "did:polygonid:polygon:amoy:2qVerifier",
            "body": {
                "callbackUrl": "https://verifier.example/cb",
                "scope": [{
                    "circuitId": "credentialAtomicQuerySigV2",
                    "id": 1731190661,
                    "query": {"type": "test", "credentialSubject": {"Nationality": {"$eq": "FIN"}}}
                }]
            }
        }))
        .unwrap();

        let request = AuthorizationRequest::parse(&bytes).unwrap();
        assert_eq!(request.body.scope.len(), 1);
        assert_eq!(request.body.scope[0].circuit_id, "credentialAtomicQuerySigV2");
        assert!(!request.body.scope[0].optional);
    }

    #[test]
    fn test_rejects_malformed_bytes() {
        let cases: [&[u8]; 5] = [b"", b"\xff\xfe", b"{", b"null", b"{\"id\":1}"];
        for bytes in cases {
            assert!(matches!(
                AuthorizationRequest::parse(bytes),
                Err(ProtocolError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_rejects_other_protocol_messages() {
        let bytes = serde_json::to_vec(&json!({
            "id": "2",
            "typ": MEDIA_TYPE_PLAIN,
            "type": "https://iden3-communication.io/credentials/1.0/offer",
            "from": "did:polygonid:polygon:amoy:2qIssuer",
            "body": {"callbackUrl": "https://issuer.example/cb"}
        }))
        .unwrap();

        assert!(matches!(
            AuthorizationRequest::parse(&bytes),
            Err(ProtocolError::UnsupportedMessageType(_))
        ));
    }

    #[test]
    fn test_rejects_packed_media_type_and_missing_callback() {
        let mut value: Value = serde_json::from_slice(&fixtures::auth_request("cb")).unwrap();
        value["typ"] = json!("application/iden3-zkp-json");
        assert!(matches!(
            AuthorizationRequest::parse(&serde_json::to_vec(&value).unwrap()),
            Err(ProtocolError::UnsupportedMediaType(_))
        ));

        let bytes = fixtures::auth_request("  ");
        assert!(matches!(
            AuthorizationRequest::parse(&bytes),
            Err(ProtocolError::MissingField("body.callbackUrl"))
        ));
    }

    #[test]
    fn test_response_threads_back_to_request() {
        let request = AuthorizationRequest::parse(&fixtures::auth_request("cb")).unwrap();
        let response = AuthorizationResponse::for_request(&request, "did:polygonid:polygon:amoy:2qHolder");

        assert_eq!(response.thid, request.id);
        assert_eq!(response.to, request.from);
        assert_eq!(response.typ, MEDIA_TYPE_ZKP);
        assert_eq!(response.body.message.as_deref(), Some("vote-session-1"));
        assert_ne!(response.id, request.id);
    }
}
