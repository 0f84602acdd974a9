mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use veil_config::Config;
use veil_storage::FileDictionaryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // One store per process; the lock file serializes against other processes
    let store = Arc::new(
        FileDictionaryStore::new(config.dictionary_path()).with_timeout(config.lock_timeout()),
    );

    match cli.command {
        cli::Commands::Redact(args) => commands::redact::handle(args, store, &config).await,
        cli::Commands::Dict(dict_cmd) => commands::dict::handle(dict_cmd, store, &config).await,
    }
}
