//! Tide bot entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Conditional order engine for an on-chain CLOB venue
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TIDE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tide_telemetry::init_logging()?;

    info!("Starting tide-bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > TIDE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("TIDE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = tide_bot::AppConfig::from_file(&config_path)?;
    info!(mode = ?config.mode, owner = %config.owner, "Configuration loaded");

    let app = tide_bot::Application::new(config)?;
    app.run_preflight().await?;
    app.seed_orders()?;
    app.run().await?;

    Ok(())
}
