// src/zkp/circuit.rs
//! The authentication circuit.
//!
//! Proves knowledge of the auth secret behind an identity commitment and binds
//! the proof to a challenge, without revealing the secret.

use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, fields::FieldVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Auth circuit with public inputs `[user_id, challenge]`.
#[derive(Clone)]
pub struct AuthCircuit<F: PrimeField> {
    /// Auth secret (private witness); `None` during setup
    pub secret: Option<F>,
    /// Poseidon commitment to the secret (public input)
    pub user_id: Option<F>,
    /// Token challenge the proof is bound to (public input)
    pub challenge: Option<F>,
    /// Poseidon hash configuration
    pub poseidon_config: PoseidonConfig<F>,
}

impl<F: PrimeField> AuthCircuit<F> {
    /// Circuit shape with no assignments, for key generation.
    pub fn blank(poseidon_config: PoseidonConfig<F>) -> Self {
        Self {
            secret: None,
            user_id: None,
            challenge: None,
            poseidon_config,
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for AuthCircuit<F> {
    /// # Constraints
    /// 1. `Poseidon(secret) == user_id`
    /// 2. `challenge` is squared into a constraint so it cannot be swapped
    ///    without invalidating the proof
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let user_id_var = FpVar::new_input(cs.clone(), || {
            self.user_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let challenge_var = FpVar::new_input(cs.clone(), || {
            self.challenge.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let mut sponge = PoseidonSpongeVar::<F>::new(cs.clone(), &self.poseidon_config);
        sponge.absorb(&secret_var)?;
        let mut squeezed = sponge.squeeze_field_elements(1)?;
        squeezed.remove(0).enforce_equal(&user_id_var)?;

        let challenge_squared = FpVar::new_witness(cs, || {
            self.challenge
                .map(|c| c * c)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        challenge_var.square()?.enforce_equal(&challenge_squared)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::poseidon::{default_poseidon_config, poseidon_hash};
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn assigned(secret: Fr, user_id: Fr) -> AuthCircuit<Fr> {
        AuthCircuit {
            secret: Some(secret),
            user_id: Some(user_id),
            challenge: Some(Fr::from(12345u64)),
            poseidon_config: default_poseidon_config(),
        }
    }

    #[test]
    fn test_satisfied_by_matching_commitment() {
        let secret = Fr::from(42u64);
        let user_id = poseidon_hash(&default_poseidon_config(), &[secret]);

        let cs = ConstraintSystem::<Fr>::new_ref();
        assigned(secret, user_id).generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_instance_variables(), 3);
    }

    #[test]
    fn test_unsatisfied_by_wrong_secret() {
        let user_id = poseidon_hash(&default_poseidon_config(), &[Fr::from(42u64)]);

        let cs = ConstraintSystem::<Fr>::new_ref();
        assigned(Fr::from(43u64), user_id)
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
