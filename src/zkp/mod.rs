// src/zkp/mod.rs
//! Zero-knowledge layer: Poseidon parameters, the auth circuit, Groth16
//! proving and verification, and JWZ token packing.

pub mod circuit;
pub mod jwz;
pub mod poseidon;
pub mod proof_generation;
pub mod proof_verification;

pub use proof_generation::{setup_auth_circuit, AuthProof, AuthProver};
pub use proof_verification::{verify_authorization_token, verifying_key_from_bytes};
