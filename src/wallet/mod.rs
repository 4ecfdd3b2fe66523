// src/wallet/mod.rs
//! The holder wallet: identity keys, identity records, credentials and the
//! orchestrator that ties them to the proving layer.

pub mod credential_storage;
pub mod identity_storage;
pub mod key_management;
pub mod orchestrator;
pub mod readiness;

pub use orchestrator::{ProofResponse, Wallet, WalletDeps};
pub use readiness::Readiness;
