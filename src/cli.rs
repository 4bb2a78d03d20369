//! CLI argument parsing for solace-exporter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: solace_exporter.yaml, env: SOLACE_CONFIG)
//! - `--listen-addr`: Listener address (env: SOLACE_LISTEN_ADDR)
//! - `--scrape-uri`: Broker base URI (env: SOLACE_SCRAPE_URI)
//! - `--username`: SEMP username (env: SOLACE_USERNAME)
//! - `--password`: SEMP password (env: SOLACE_PASSWORD)
//! - `--timeout-ms`: Per data source timeout (env: SOLACE_TIMEOUT_MS)
//! - `--ssl-verify`: Verify the broker certificate (env: SOLACE_SSL_VERIFY)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: SOLACE_LOG_LEVEL)
//! - `--log-format`: Log output format (text/json, env: SOLACE_LOG_FORMAT)
//! - `--validate`: Validate configuration without starting server
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// solace-exporter - Prometheus exporter for Solace PubSub+ brokers
///
/// Scrapes SEMP v1 and SEMP v2 statistics from a broker and exports them in
/// Prometheus format.
///
/// Environment variables can be used for all configuration options.
/// CLI arguments take precedence over environment variables,
/// which take precedence over config file values.
#[derive(Parser, Debug)]
#[command(name = "solace-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "solace_exporter.yaml",
        env = "SOLACE_CONFIG"
    )]
    pub config: PathBuf,

    /// Listener address, e.g. 0.0.0.0:9628 (overrides config file)
    #[arg(long, value_name = "ADDRESS", env = "SOLACE_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Broker base URI (overrides config file)
    #[arg(long, value_name = "URL", env = "SOLACE_SCRAPE_URI")]
    pub scrape_uri: Option<String>,

    /// SEMP username (overrides config file)
    #[arg(long, value_name = "USERNAME", env = "SOLACE_USERNAME")]
    pub username: Option<String>,

    /// SEMP password (overrides config file)
    #[arg(long, value_name = "PASSWORD", env = "SOLACE_PASSWORD")]
    pub password: Option<String>,

    /// Per data source timeout in milliseconds (overrides config file)
    #[arg(long, value_name = "MS", env = "SOLACE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Verify the broker TLS certificate (overrides config file)
    #[arg(long, env = "SOLACE_SSL_VERIFY")]
    pub ssl_verify: Option<bool>,

    /// Validate configuration without starting server
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "SOLACE_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "SOLACE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Layer CLI/environment overrides on top of the loaded file
    pub fn apply(&self, config: &mut Config) {
        if let Some(addr) = &self.listen_addr {
            config.listen_addr = addr.clone();
        }
        if let Some(uri) = &self.scrape_uri {
            config.scrape.uri = uri.clone();
        }
        if let Some(username) = &self.username {
            config.semp_auth.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.semp_auth.password = password.clone();
        }
        if let Some(timeout) = self.timeout_ms {
            config.scrape.timeout_ms = timeout;
        }
        if let Some(verify) = self.ssl_verify {
            config.scrape.ssl_verify = verify;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log output format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text output
    Text,
    /// One JSON object per event
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}
