// src/lib.rs

//! # Quorum Wallet
//!
//! Identity wallet agent for the Quorum voting app. A bank-ID login seeds a
//! Polygon ID style identity; the wallet then stores the credentials issued
//! to it and answers verifier authorization requests with Groth16 auth proofs.
//!
//! ## Layers
//! 1. **Wallet**: the orchestrator, identity keys, records and credentials
//! 2. **Circuits**: artifact download and caching for the auth circuit
//! 3. **ZKP**: the auth circuit, prover and JWZ token format
//! 4. **Services**: issuer and verifier clients, and the HTTP API
//! 5. **Storage**: key-value backends and the active-identity pointer

pub mod circuits;  // Circuit artifact loading
pub mod config;    // Layered settings
pub mod error;     // Error taxonomy
pub mod models;    // Data structures
pub mod services;  // Issuer, verifier and API
pub mod storage;   // Key-value persistence
pub mod utils;     // Hashing and encoding helpers
pub mod wallet;    // Identity session
pub mod zkp;       // Zero-knowledge proofs
