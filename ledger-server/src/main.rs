//! Ledger account service

use anyhow::Context;
use ledger_core::auth::{Authenticator, CredentialHasher};
use ledger_core::{MemoryLedger, SharedLedger};
use ledger_engine::FjallLedger;
use ledger_server::{AppState, LedgerServer, ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo accounts created by `--seed`: first name, last name, email, password
const SEED_ACCOUNTS: &[(&str, &str, &str, &str)] = &[
    ("Ada", "Lovelace", "ada@example.com", "112233"),
    ("Alan", "Turing", "alan@example.com", "223344"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;

    info!("Starting ledger server");
    info!("Bind address: {}", config.bind_addr);
    info!("Token validity: {}s", config.token_validity.as_secs());

    let ledger: SharedLedger = if config.ephemeral {
        info!("Using in-memory ledger; accounts are lost on exit");
        Arc::new(MemoryLedger::new())
    } else {
        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!("failed to create data directory {}", config.data_dir.display())
            })?;
            info!("Created data directory: {}", config.data_dir.display());
        }

        let ledger = FjallLedger::open(&config.data_dir)
            .context("failed to initialize storage engine")?;
        info!("Storage engine initialized at {}", config.data_dir.display());
        Arc::new(ledger)
    };

    let state = AppState::new(
        ledger,
        &config.signing_secret,
        config.token_validity,
        CredentialHasher::new(),
    )
    .context("failed to initialize authentication")?;

    if config.seed {
        seed_accounts(&state.authenticator)?;
    }

    let server = LedgerServer::new(state);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    server
        .serve(config.bind_addr, shutdown)
        .await
        .context("server error")?;

    info!("Server shutdown gracefully");
    Ok(())
}

fn seed_accounts(authenticator: &Authenticator) -> anyhow::Result<()> {
    for (first_name, last_name, email, password) in SEED_ACCOUNTS {
        let account = authenticator
            .enroll(first_name, last_name, email, password)
            .with_context(|| format!("failed to seed account for {}", email))?;
        info!(
            account_id = %account.id,
            account_number = %account.number,
            "Seeded demo account for {}",
            email
        );
    }
    Ok(())
}
