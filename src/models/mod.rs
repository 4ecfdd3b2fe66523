// src/models/mod.rs
//! Data models shared across the wallet.

pub mod authorization;
pub mod claims;
pub mod credential;
pub mod did;
pub mod identity;
