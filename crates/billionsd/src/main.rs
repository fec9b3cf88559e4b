//! Billions Club daemon
//!
//! Serves the progression, referral, verification and leaderboard API over HTTP.

use anyhow::{Context, Result};
use billions_common::SqliteUserStore;
use billionsd::config::Config;
use billionsd::server::{self, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "billionsd")]
#[command(about = "Billions Club API daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Path to config.toml (defaults to /etc/billions/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("billionsd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load(args.config.as_deref());
    let store = SqliteUserStore::open(&config.storage.db_path)
        .with_context(|| format!("Failed to open {}", config.storage.db_path.display()))?;
    info!("  User store at {}", config.storage.db_path.display());

    server::run(AppState::new(Arc::new(store), config)).await
}
