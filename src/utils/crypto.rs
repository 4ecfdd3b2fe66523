// src/utils/crypto.rs
//! Hashing helpers shared by identity derivation and token packing.
//!
//! SHA-256 is used wherever bytes have to be mapped into the BN254 scalar
//! field outside of a circuit (seed → auth secret, token → challenge).

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

/// Hashes the concatenation of `parts` and reduces the digest into the scalar field.
///
/// The digest is read as a little-endian integer, so the result is uniform
/// enough for challenges and secrets while staying deterministic.
pub fn hash_to_field(parts: &[&[u8]]) -> Fr {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Fr::from_le_bytes_mod_order(&hasher.finalize())
}
