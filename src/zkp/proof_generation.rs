// src/zkp/proof_generation.rs
//! Zero-knowledge proof generation for the auth circuit.
//!
//! This module provides key generation (the trusted setup that produces the
//! circuit artifacts) and the prover the wallet uses to answer authorization
//! requests. Proofs are Groth16 over BN254 with Poseidon commitments.

use crate::circuits::CircuitData;
use crate::error::ZkpError;
use crate::utils::serialization::{field_to_decimal, from_canonical_bytes, to_canonical_bytes};
use crate::zkp::circuit::AuthCircuit;
use crate::zkp::poseidon::{default_poseidon_config, poseidon_hash, CircuitParameters};
use ark_bn254::{Bn254, Fr};
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// A Groth16 auth proof together with its public signals.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthProof {
    pub proof: Proof<Bn254>,
    /// Identity commitment (public signal 0)
    pub user_id: Fr,
    /// Token challenge (public signal 1)
    pub challenge: Fr,
}

impl AuthProof {
    /// Public inputs in circuit order.
    pub fn public_inputs(&self) -> [Fr; 2] {
        [self.user_id, self.challenge]
    }

    /// Public signals as decimal strings, as carried in the token.
    pub fn pub_signals(&self) -> Vec<String> {
        self.public_inputs().iter().map(field_to_decimal).collect()
    }

    /// Base64 of the compressed proof points.
    pub fn proof_base64(&self) -> Result<String, ZkpError> {
        Ok(base64::encode(to_canonical_bytes(&self.proof)?))
    }
}

/// Prover loaded from a set of circuit artifacts.
///
/// Holds the Poseidon parameters (for commitments) and the proving key. The
/// verification key embedded in the proving key is used to check every proof
/// before it leaves the wallet.
pub struct AuthProver {
    config: PoseidonConfig<Fr>,
    proving_key: ProvingKey<Bn254>,
}

impl AuthProver {
    /// Decodes and cross-checks the artifact triple.
    ///
    /// # Errors
    /// [`ZkpError::InvalidArtifact`] when any artifact fails to decode, or when
    /// the verification key is not the one the proving key was generated with.
    pub fn from_circuit(data: &CircuitData) -> Result<Self, ZkpError> {
        let parameters: CircuitParameters = from_canonical_bytes(&data.parameters)
            .map_err(|e| invalid_artifact("parameters", e))?;
        let config = parameters.into_config()?;

        let proving_key: ProvingKey<Bn254> = from_canonical_bytes(&data.proving_key)
            .map_err(|e| invalid_artifact("proving_key", e))?;
        let verifying_key: VerifyingKey<Bn254> = from_canonical_bytes(&data.verification_key)
            .map_err(|e| invalid_artifact("verification_key", e))?;

        if proving_key.vk != verifying_key {
            return Err(ZkpError::InvalidArtifact {
                artifact: "verification_key",
                message: "does not belong to the proving key".into(),
            });
        }

        Ok(Self {
            config,
            proving_key,
        })
    }

    /// Poseidon commitment to `secret`; the identity's `userId`.
    pub fn commitment(&self, secret: &Fr) -> Fr {
        poseidon_hash(&self.config, &[*secret])
    }

    /// Proves knowledge of `secret` bound to `challenge`.
    ///
    /// CPU heavy; call from a blocking context.
    ///
    /// # Errors
    /// - [`ZkpError::Synthesis`] if the prover fails
    /// - [`ZkpError::Rejected`] if the produced proof does not verify
    pub fn prove(&self, secret: Fr, challenge: Fr) -> Result<AuthProof, ZkpError> {
        let user_id = self.commitment(&secret);
        let circuit = AuthCircuit {
            secret: Some(secret),
            user_id: Some(user_id),
            challenge: Some(challenge),
            poseidon_config: self.config.clone(),
        };

        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut OsRng)?;
        let auth = AuthProof {
            proof,
            user_id,
            challenge,
        };

        if !self.verify(&auth)? {
            return Err(ZkpError::Rejected);
        }
        Ok(auth)
    }

    /// Checks a proof against this circuit's verification key.
    pub fn verify(&self, proof: &AuthProof) -> Result<bool, ZkpError> {
        Ok(Groth16::<Bn254>::verify(
            &self.proving_key.vk,
            &proof.public_inputs(),
            &proof.proof,
        )?)
    }
}

/// Runs the circuit-specific setup and encodes the resulting artifacts.
///
/// # Arguments
/// * `circuit_id` - Identifier the artifacts are published under
/// * `rng` - Randomness for the toxic waste; must be discarded afterwards
pub fn setup_auth_circuit<R: RngCore + CryptoRng>(
    circuit_id: &str,
    rng: &mut R,
) -> Result<CircuitData, ZkpError> {
    let config = default_poseidon_config();
    let (proving_key, verifying_key) =
        Groth16::<Bn254>::setup(AuthCircuit::blank(config.clone()), rng)?;

    Ok(CircuitData {
        circuit_id: circuit_id.to_string(),
        parameters: to_canonical_bytes(&CircuitParameters::from(&config))?,
        proving_key: to_canonical_bytes(&proving_key)?,
        verification_key: to_canonical_bytes(&verifying_key)?,
    })
}

fn invalid_artifact(artifact: &'static str, error: impl std::fmt::Display) -> ZkpError {
    ZkpError::InvalidArtifact {
        artifact,
        message: error.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prove_and_verify() {
        let prover = AuthProver::from_circuit(&fixtures::circuit_data()).unwrap();
        let secret = Fr::from(1_000_003u64);

        let proof = prover.prove(secret, Fr::from(77u64)).unwrap();
        assert_eq!(proof.user_id, prover.commitment(&secret));
        assert!(prover.verify(&proof).unwrap());

        let swapped = AuthProof {
            challenge: Fr::from(78u64),
            ..proof.clone()
        };
        assert!(!prover.verify(&swapped).unwrap());

        let signals = proof.pub_signals();
        assert_eq!(signals[1], "77");
        assert!(!proof.proof_base64().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_corrupted_artifacts() {
        let mut data = fixtures::circuit_data();
        data.proving_key.truncate(32);
        assert!(matches!(
            AuthProver::from_circuit(&data),
            Err(ZkpError::InvalidArtifact { artifact: "proving_key", .. })
        ));

        let mut data = fixtures::circuit_data();
        data.parameters = vec![1, 2, 3];
        assert!(matches!(
            AuthProver::from_circuit(&data),
            Err(ZkpError::InvalidArtifact { artifact: "parameters", .. })
        ));
    }

    #[test]
    fn test_rejects_parameters_with_overflowing_rate() {
        let mut params = CircuitParameters::from(&default_poseidon_config());
        params.rate = u64::MAX;
        let mut data = fixtures::circuit_data();
        data.parameters = to_canonical_bytes(&params).unwrap();

        assert!(matches!(
            AuthProver::from_circuit(&data),
            Err(ZkpError::InvalidArtifact { artifact: "parameters", .. })
        ));
    }

    #[test]
    fn test_rejects_mismatched_verification_key() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let other = setup_auth_circuit("authV2", &mut StdRng::seed_from_u64(99)).unwrap();
        let mut data = fixtures::circuit_data();
        data.verification_key = other.verification_key;

        assert!(matches!(
            AuthProver::from_circuit(&data),
            Err(ZkpError::InvalidArtifact { artifact: "verification_key", .. })
        ));
    }
}
