// src/zkp/poseidon.rs
//! Poseidon hash parameters for the BN254 scalar field.
//!
//! The same parameter set is used natively (identity commitments) and inside
//! the auth circuit, so it is shipped as the first circuit artifact rather than
//! regenerated by every party.
//!
//! ## Parameters
//! - Full rounds: 8
//! - Partial rounds: 57
//! - Alpha (S-box): 5
//! - Rate: 2
//! - Capacity: 1

use crate::error::ZkpError;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use once_cell::sync::Lazy;

pub const FULL_ROUNDS: usize = 8;
pub const PARTIAL_ROUNDS: usize = 57;
pub const ALPHA: u64 = 5;
pub const RATE: usize = 2;
pub const CAPACITY: usize = 1;

/// Lazily generated default parameters.
///
/// Generating the round constants walks a Grain LFSR, which is slow enough
/// that it should only ever happen once per process.
static DEFAULT_CONFIG: Lazy<PoseidonConfig<Fr>> = Lazy::new(generate_poseidon_config);

/// Generates the Poseidon parameters for BN254.
///
/// # Returns
/// `PoseidonConfig<Fr>` with round constants and MDS matrix derived from the
/// field size and round numbers above.
pub fn generate_poseidon_config() -> PoseidonConfig<Fr> {
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        u64::from(Fr::MODULUS_BIT_SIZE),
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );
    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark,
        mds,
        rate: RATE,
        capacity: CAPACITY,
    }
}

/// Clone of the cached default configuration.
pub fn default_poseidon_config() -> PoseidonConfig<Fr> {
    DEFAULT_CONFIG.clone()
}

/// Hashes `inputs` with a fresh sponge and squeezes one element.
pub fn poseidon_hash(config: &PoseidonConfig<Fr>, inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(config);
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_native_field_elements(1)[0]
}

/// Serializable form of a Poseidon parameter set.
///
/// This is the "parameters" artifact of the auth circuit.
#[derive(CanonicalSerialize, CanonicalDeserialize, Clone, Debug, PartialEq)]
pub struct CircuitParameters {
    pub full_rounds: u64,
    pub partial_rounds: u64,
    pub alpha: u64,
    pub rate: u64,
    pub capacity: u64,
    pub ark: Vec<Vec<Fr>>,
    pub mds: Vec<Vec<Fr>>,
}

impl From<&PoseidonConfig<Fr>> for CircuitParameters {
    fn from(config: &PoseidonConfig<Fr>) -> Self {
        Self {
            full_rounds: config.full_rounds as u64,
            partial_rounds: config.partial_rounds as u64,
            alpha: config.alpha,
            rate: config.rate as u64,
            capacity: config.capacity as u64,
            ark: config.ark.clone(),
            mds: config.mds.clone(),
        }
    }
}

impl CircuitParameters {
    /// Checks the matrix shapes and converts back into a sponge configuration.
    ///
    /// # Errors
    /// [`ZkpError::InvalidArtifact`] when the round constants or the MDS matrix
    /// do not match the declared round numbers and state width.
    pub fn into_config(self) -> Result<PoseidonConfig<Fr>, ZkpError> {
        let invalid = |message: String| ZkpError::InvalidArtifact {
            artifact: "parameters",
            message,
        };

        if self.rate == 0 || self.full_rounds % 2 != 0 {
            return Err(invalid("rate must be positive and full rounds even".into()));
        }
        let to_usize = |value: u64, field: &str| {
            usize::try_from(value).map_err(|_| invalid(format!("{field} {value} is out of range")))
        };
        let rate = to_usize(self.rate, "rate")?;
        let capacity = to_usize(self.capacity, "capacity")?;
        let full_rounds = to_usize(self.full_rounds, "full rounds")?;
        let partial_rounds = to_usize(self.partial_rounds, "partial rounds")?;
        let width = rate
            .checked_add(capacity)
            .ok_or_else(|| invalid("state width overflows".into()))?;
        let rounds = full_rounds
            .checked_add(partial_rounds)
            .ok_or_else(|| invalid("round count overflows".into()))?;
        if self.ark.len() != rounds || self.ark.iter().any(|row| row.len() != width) {
            return Err(invalid(format!("expected {rounds}x{width} round constants")));
        }
        if self.mds.len() != width || self.mds.iter().any(|row| row.len() != width) {
            return Err(invalid(format!("expected a {width}x{width} MDS matrix")));
        }

        Ok(PoseidonConfig {
            full_rounds,
            partial_rounds,
            alpha: self.alpha,
            ark: self.ark,
            mds: self.mds,
            rate,
            capacity,
        })
    }
}
