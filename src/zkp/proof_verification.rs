// src/zkp/proof_verification.rs
//! # Zero-Knowledge Token Verification
//!
//! Verifies authorization response tokens produced by the wallet. A token is
//! accepted only when:
//! - The header names the Groth16 auth circuit
//! - The challenge signal matches the header and payload actually received
//! - The proof verifies against the trusted verification key
//! - The sender DID is the one derived from the proven `userId`
//!
//! ## Security Considerations
//! - Always verify against a verification key obtained out of band
//! - The payload is only trusted after all checks above pass

use crate::circuits::AUTH_CIRCUIT_ID;
use crate::error::ZkpError;
use crate::models::authorization::AuthorizationResponse;
use crate::models::did::Did;
use crate::utils::serialization::{field_from_decimal, field_to_le_bytes, from_canonical_bytes};
use crate::zkp::jwz::{self, GROTH16_ALG};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;

/// A token that passed every check.
#[derive(Debug, Clone)]
pub struct VerifiedAuthorization {
    pub response: AuthorizationResponse,
    pub sender: Did,
    pub user_id: Fr,
}

/// Decodes a verification key artifact.
pub fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkpError> {
    from_canonical_bytes(bytes).map_err(|e| ZkpError::InvalidArtifact {
        artifact: "verification_key",
        message: e.to_string(),
    })
}

/// Verifies an authorization response token.
///
/// # Arguments
/// * `token` - Compact JWZ token
/// * `verifying_key` - Trusted auth circuit verification key
///
/// # Errors
/// - [`ZkpError::MalformedToken`] for structural problems and DID mismatches
/// - [`ZkpError::Rejected`] when the Groth16 check fails
pub fn verify_authorization_token(
    token: &str,
    verifying_key: &VerifyingKey<Bn254>,
) -> Result<VerifiedAuthorization, ZkpError> {
    let parsed = jwz::parse(token)?;

    if parsed.header.alg != GROTH16_ALG || parsed.header.circuit_id != AUTH_CIRCUIT_ID {
        return Err(ZkpError::MalformedToken(format!(
            "unsupported proof {}/{}",
            parsed.header.alg, parsed.header.circuit_id
        )));
    }

    let [user_id, challenge] = parsed.proof.pub_signals.as_slice() else {
        return Err(ZkpError::MalformedToken("expected two public signals".into()));
    };
    let user_id = field_from_decimal(user_id).map_err(ZkpError::MalformedToken)?;
    let challenge = field_from_decimal(challenge).map_err(ZkpError::MalformedToken)?;
    if challenge != parsed.challenge {
        return Err(ZkpError::MalformedToken(
            "challenge does not match token contents".into(),
        ));
    }

    let proof_bytes = base64::decode(&parsed.proof.proof)
        .map_err(|e| ZkpError::MalformedToken(format!("proof encoding: {e}")))?;
    let proof: Proof<Bn254> = from_canonical_bytes(&proof_bytes)?;

    if !Groth16::<Bn254>::verify(verifying_key, &[user_id, challenge], &proof)? {
        return Err(ZkpError::Rejected);
    }

    let response: AuthorizationResponse = serde_json::from_slice(&parsed.payload)
        .map_err(|e| ZkpError::MalformedToken(format!("payload: {e}")))?;
    let sender = Did::parse(&response.from)
        .map_err(|e| ZkpError::MalformedToken(format!("sender: {e}")))?;
    let expected = Did::from_state(&sender.options(), &field_to_le_bytes(&user_id))
        .map_err(|e| ZkpError::MalformedToken(format!("sender: {e}")))?;
    if expected != sender {
        return Err(ZkpError::MalformedToken(
            "sender DID does not match the proven identity".into(),
        ));
    }

    Ok(VerifiedAuthorization {
        response,
        sender,
        user_id,
    })
}
