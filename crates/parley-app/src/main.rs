//! Parley binary entry point.
//!
//! Resolves configuration, opens the database, builds the completion client
//! and serves the HTTP API until the process is stopped.

mod cli;

use std::sync::Arc;

use clap::Parser;

use parley_api::{start_server, AppState};
use parley_completion::AzureCompletionClient;
use parley_core::config::ParleyConfig;
use parley_storage::Database;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    config.server.port = args.resolve_port(config.server.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if config.completion.endpoint.is_empty() {
        tracing::warn!("No completion endpoint configured; chat requests will fail");
    }

    // Storage.
    let data_dir = cli::expand_home(&config.general.data_dir);
    let db_path = data_dir.join("parley.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Completion client.
    let completion = AzureCompletionClient::new(config.completion.clone())?;

    let state = AppState::new(config, db, Arc::new(completion));
    start_server(state).await?;

    Ok(())
}
