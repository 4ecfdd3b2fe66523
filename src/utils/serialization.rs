// src/utils/serialization.rs
//! Serialization utilities for the wallet.
//!
//! Provides serialization helpers for:
//! - JSON data structures
//! - Field elements (decimal strings, as iden3 public signals are written)
//! - Canonical arkworks encodings of keys and proofs

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use num_bigint::BigUint;
use serde::Serialize;
use std::str::FromStr;

/// Serializes a value to a JSON string.
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Writes a field element as a base-10 integer.
pub fn field_to_decimal(value: &Fr) -> String {
    BigUint::from(value.into_bigint()).to_string()
}

/// Parses a base-10 field element.
///
/// Rejects values that are not canonical (greater than or equal to the modulus),
/// so every field element has exactly one accepted spelling.
pub fn field_from_decimal(value: &str) -> Result<Fr, String> {
    let integer = BigUint::from_str(value).map_err(|e| format!("'{value}' is not an integer: {e}"))?;
    if integer >= BigUint::from(Fr::MODULUS) {
        return Err(format!("'{value}' is not a canonical field element"));
    }
    Ok(Fr::from(integer))
}

/// Little-endian 32-byte encoding of a field element.
pub fn field_to_le_bytes(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_le();
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// Compressed canonical encoding of an arkworks value.
pub fn to_canonical_bytes<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

/// Decodes (and validates) a compressed canonical encoding.
pub fn from_canonical_bytes<T: CanonicalDeserialize>(bytes: &[u8]) -> Result<T, SerializationError> {
    T::deserialize_compressed(bytes)
}
