// src/main.rs

//! # Quorum Wallet - Main Entry Point
//!
//! `serve` starts the wallet agent API. `setup-circuits` runs a local trusted
//! setup for the auth circuit and writes the three artifact files, ready to
//! be served from the configured circuits URL.
//!
//! ## Configuration
//! Settings come from `quorum.toml` (or the file named by `QUORUM_CONFIG`)
//! and `QUORUM__*` environment variables, e.g. `QUORUM__SERVER__PORT=9000`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use quorum_wallet::config::Settings;
use quorum_wallet::services::{ApiServer, CredentialIssuer, Verifier};
use quorum_wallet::storage::{FileStore, KeyValueStore, MemoryStore};
use quorum_wallet::wallet::{Wallet, WalletDeps};
use quorum_wallet::zkp::setup_auth_circuit;
use rand::rngs::OsRng;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quorum-wallet", version, about = "Identity wallet agent for Quorum")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the wallet API server
    Serve,
    /// Generate auth circuit artifacts
    SetupCircuits {
        /// Directory to write the artifacts to
        #[arg(long, default_value = "circuits")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load settings")?;

    match cli.command {
        Command::Serve => serve(settings).await,
        Command::SetupCircuits { out } => setup_circuits(&settings, out).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    settings.log_summary();

    let store: Arc<dyn KeyValueStore> = if settings.storage.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(&settings.storage.dir).context("failed to open wallet storage")?)
    };

    let wallet = Wallet::new(WalletDeps::from_settings(&settings, store))?;
    let issuer = CredentialIssuer::new(settings.issuer.clone())?;
    let verifier = Verifier::new(settings.verifier.clone())?;
    let api_server = ApiServer::new(Arc::new(wallet), issuer, verifier)
        .with_allowed_origins(&settings.server.allowed_origins);

    let addr: SocketAddr = settings
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.bind_addr()))?;
    api_server
        .run(addr)
        .await
        .with_context(|| format!("API server on {} failed", addr))
}

async fn setup_circuits(settings: &Settings, out: PathBuf) -> Result<()> {
    let circuits = &settings.circuits;
    info!("Running trusted setup for circuit {}", circuits.circuit_id);

    let circuit_id = circuits.circuit_id.clone();
    let data = tokio::task::spawn_blocking(move || setup_auth_circuit(&circuit_id, &mut OsRng))
        .await??;

    tokio::fs::create_dir_all(&out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;
    for (file, bytes) in [
        (&circuits.parameters_file, &data.parameters),
        (&circuits.proving_key_file, &data.proving_key),
        (&circuits.verification_key_file, &data.verification_key),
    ] {
        let path = out.join(file);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    }
    Ok(())
}
