//! chainwatch exporter daemon
//!
//! Polls the configured Cosmos SDK nodes on every scrape and serves:
//! - `GET /metrics` - Prometheus text format
//! - `GET /health` - liveness probe

use anyhow::Context;
use chainwatch_exporter::{logging, App, AppConfig, MetricsServer};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chainwatch")]
#[command(about = "Prometheus exporter for Cosmos SDK nodes")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", env = "CHAINWATCH_CONFIG")]
    config: PathBuf,

    /// Metrics listen address (overrides config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started_at = Utc::now();
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?
        .with_overrides(cli.listen, cli.verbose);
    config
        .validate()
        .with_context(|| format!("validating configuration from {}", cli.config.display()))?;

    logging::init(&config.log)?;

    info!(
        config = %cli.config.display(),
        nodes = config.nodes.len(),
        listen = %config.listen_address,
        "chainwatch starting"
    );

    let app = Arc::new(App::from_config(&config, started_at)?);
    info!(nodes = ?app.node_names(), "Nodes configured");

    let server = MetricsServer::new(config.listen_addr()?, app);
    if let Err(e) = server.serve(shutdown_signal()).await {
        error!(error = %e, "Metrics server failed");
        return Err(e.into());
    }

    info!("chainwatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
