//! solace-exporter - Prometheus exporter for Solace PubSub+ brokers
//!
//! This binary serves Prometheus-compatible metrics endpoints backed by
//! SEMP v1 and SEMP v2 requests to a broker.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use solace_exporter::{cli::Cli, config::Config, server};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    solace_exporter::init_logging(&cli.log_level.to_string(), cli.log_format)?;

    // Ignored if a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config);

    if cli.validate {
        return Ok(match config.validate() {
            Ok(()) => {
                println!("Configuration is valid: {}", cli.config.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {}", e);
                ExitCode::FAILURE
            }
        });
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration is invalid");
        return Err(e.into());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %config.scrape.uri,
        "Starting solace-exporter"
    );

    server::run(config).await?;

    Ok(ExitCode::SUCCESS)
}
