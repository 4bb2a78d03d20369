//! HTTP server module
//!
//! Provides the Axum-based HTTP server for serving metrics.

pub mod auth;
pub mod handlers;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::{middleware, routing::get, Router};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::scrape::{Orchestrator, ScrapeSettings};
use crate::semp::SempClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Scrape orchestrator for the configured broker
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Build the SEMP client and orchestrator for `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let client = SempClient::new(&config.scrape, config.semp_auth.clone())?;
        let orchestrator = Orchestrator::new(Arc::new(client), ScrapeSettings::from_config(&config));
        Ok(Self {
            config: Arc::new(config),
            orchestrator,
        })
    }
}

/// Build the router. Everything but `/health` sits behind exporter auth.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(handlers::root))
        .route("/solace", get(handlers::adhoc))
        .route("/:target", get(handlers::endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::basic_auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
///
/// # Errors
/// Returns an error if the listener cannot be bound or TLS material cannot be loaded
pub async fn run(config: Config) -> Result<()> {
    let addr = resolve(&config.listen_addr).await?;
    let listen_uri = config.listen_uri();
    let tls = config.tls.clone();
    let endpoints: Vec<String> = config.endpoints.keys().cloned().collect();

    let state = AppState::from_config(config)?;
    let app = router(state);

    info!(address = %listen_uri, endpoints = ?endpoints, "Server listening");

    if tls.enable {
        let rustls = tls::rustls_config(&tls).await?;
        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
        });
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn resolve(listen_addr: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(listen_addr)
        .await
        .map_err(|e| anyhow!("Invalid listen_addr '{}': {}", listen_addr, e))?
        .next()
        .ok_or_else(|| anyhow!("listen_addr '{}' did not resolve", listen_addr))
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
