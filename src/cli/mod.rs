//! # Command Line Interface
//!
//! Operator commands for reading secrets through the cache, resolving database
//! connection parameters and watching signing key rotation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::db::DatabaseCredentials;
use crate::errors::{Error, Result};
use crate::rotation::{KeyRotationController, RotationOutcome};
use crate::secrets::{CachedSecretsClient, SecretsClient, VersionStage};

#[derive(Parser, Debug)]
#[command(name = "secrets-cache")]
#[command(about = "Cached secrets store access and signing key rotation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "SECRETS_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the value of a secret
    Get {
        /// Secret name or ARN
        name: String,

        /// Version stage: AWSCURRENT, AWSPREVIOUS or AWSPENDING
        #[arg(long, default_value = "AWSCURRENT")]
        stage: VersionStage,

        /// Bypass the cache
        #[arg(long)]
        force_refresh: bool,
    },

    /// Print database connection parameters with the password redacted
    DbParams {
        /// Bypass the cache
        #[arg(long)]
        force_refresh: bool,
    },

    /// Check the signing key on its rotation interval and report changes
    WatchKey {
        /// Stop after this many checks
        #[arg(long)]
        checks: Option<u32>,
    },
}

/// Execute `command` against `store`, writing results to `out`.
pub async fn run<C, W>(command: Commands, config: &AppConfig, store: C, out: &mut W) -> Result<()>
where
    C: SecretsClient + 'static,
    W: Write,
{
    let store = Arc::new(store);
    let cache = Arc::new(CachedSecretsClient::new(Arc::clone(&store), config.cache.refresh_interval()));

    match command {
        Commands::Get { name, stage, force_refresh } => {
            let value = cache.get(&name, stage, force_refresh).await?;
            writeln!(out, "{}", value.expose_secret())?;
        }
        Commands::DbParams { force_refresh } => {
            let database = config.require_database()?;
            let credentials = DatabaseCredentials::new(cache, &database.secret_id, database.engine)?;
            let params = credentials.connection_params(force_refresh).await?;
            let rendered = serde_json::to_string_pretty(&params)
                .map_err(|e| Error::internal(format!("Failed to render parameters: {}", e)))?;
            writeln!(out, "{}", rendered)?;
        }
        Commands::WatchKey { checks } => {
            let rotation = config.require_rotation()?.clone();
            let interval = rotation.refresh_interval();
            let controller = KeyRotationController::from_store(store, rotation).await?;
            writeln!(out, "active {}", controller.current_keys().active.fingerprint())?;
            out.flush()?;

            let mut remaining = checks;
            while remaining != Some(0) {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => break,
                }

                let outcome = controller.check_and_rotate().await;
                if outcome == RotationOutcome::Rotated {
                    let keys = controller.current_keys();
                    let fallback = keys.fallbacks.first().map(|key| key.fingerprint());
                    writeln!(
                        out,
                        "rotated active {} fallback {}",
                        keys.active.fingerprint(),
                        fallback.as_deref().unwrap_or("-")
                    )?;
                } else {
                    writeln!(out, "{}", outcome.as_str())?;
                }
                out.flush()?;
                remaining = remaining.map(|n| n - 1);
            }
        }
    }

    Ok(())
}
