// src/circuits/mod.rs
//! Circuit artifacts: fetching, caching and persisting the files the prover needs.
//!
//! Every circuit is described by three artifacts, which are always handled
//! together: Poseidon parameters, the Groth16 proving key and the Groth16
//! verification key.

pub mod loader;
pub mod storage;

pub use loader::CircuitLoader;
pub use storage::CircuitStorage;

/// Circuit id of the authentication circuit.
pub const AUTH_CIRCUIT_ID: &str = "authV2";

/// The artifact triple of one circuit, as raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CircuitData {
    pub circuit_id: String,
    pub parameters: Vec<u8>,
    pub proving_key: Vec<u8>,
    pub verification_key: Vec<u8>,
}

impl std::fmt::Debug for CircuitData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitData")
            .field("circuit_id", &self.circuit_id)
            .field("parameters", &self.parameters.len())
            .field("proving_key", &self.proving_key.len())
            .field("verification_key", &self.verification_key.len())
            .finish()
    }
}

/// Names of the three artifacts, as used in storage keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Parameters,
    ProvingKey,
    VerificationKey,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Parameters,
        ArtifactKind::ProvingKey,
        ArtifactKind::VerificationKey,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Parameters => "parameters",
            ArtifactKind::ProvingKey => "proving_key",
            ArtifactKind::VerificationKey => "verification_key",
        }
    }
}
