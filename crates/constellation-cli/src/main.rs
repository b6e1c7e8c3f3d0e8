//! Constellation CLI entry point.

use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use constellation_cli::cli::Cli;
use constellation_cli::commands;
use constellation_client::ApiClient;
use constellation_store::CmdbStore;

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (for CONSTELLATION_API_URL etc.)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> commands::Result<()> {
    let config = cli.client_config();
    debug!(base_url = %config.base_url, timeout = ?config.timeout, "Connecting to CMDB API");

    let client = ApiClient::new(config)?;
    let store = CmdbStore::new(Arc::new(client));
    commands::execute(cli.command, &store).await
}
