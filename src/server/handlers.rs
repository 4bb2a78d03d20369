//! HTTP request handlers
//!
//! Contains handlers for all HTTP endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, instrument};

use super::AppState;
use crate::config::DataSource;
use crate::error::AppError;
use crate::transformer;

/// Prefix of configured endpoint paths, `/solace-<name>`
pub const ENDPOINT_PREFIX: &str = "solace-";

/// Endpoint name used for ad-hoc `/solace?m.<Category>=...` scrapes
pub const ADHOC_ENDPOINT: &str = "solace";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Health status
    status: String,
    /// Application version
    version: String,
}

/// Root endpoint - lists the configured endpoints
pub async fn root(State(state): State<AppState>) -> Html<String> {
    let links: String = state
        .config
        .endpoints
        .iter()
        .map(|(name, sources)| {
            format!(
                "        <li><a href=\"/{prefix}{name}\">/{prefix}{name}</a> ({count} data sources)</li>\n",
                prefix = ENDPOINT_PREFIX,
                name = name,
                count = sources.len()
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Solace Exporter</title>
</head>
<body>
    <h1>Solace Exporter</h1>
    <p>Version: {}</p>
    <p>Broker: {}</p>
    <ul>
        <li><a href="/health">Health Check</a></li>
{}    </ul>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
        state.config.scrape.uri,
        links
    );
    Html(html)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `/solace-<endpoint>`: scrape the configured data sources of one endpoint
#[instrument(skip(state), name = "endpoint_handler")]
pub async fn endpoint(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Response, AppError> {
    let name = target
        .strip_prefix(ENDPOINT_PREFIX)
        .ok_or_else(|| AppError::UnknownEndpoint(target.clone()))?;
    let sources = state
        .config
        .endpoints
        .get(name)
        .ok_or_else(|| AppError::UnknownEndpoint(name.to_string()))?;

    Ok(scrape(&state, name, sources).await)
}

/// `/solace?m.<Category>=vpn|item|metrics`: scrape ad-hoc data sources
#[instrument(skip(state, params), name = "adhoc_handler")]
pub async fn adhoc(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let sources = adhoc_sources(&params)?;
    Ok(scrape(&state, ADHOC_ENDPOINT, &sources).await)
}

/// Parse every `m.<key>` query parameter into a data source
pub fn adhoc_sources(params: &[(String, String)]) -> Result<Vec<DataSource>, AppError> {
    let sources = params
        .iter()
        .filter_map(|(key, value)| key.strip_prefix("m.").map(|name| (name, value)))
        .map(|(name, value)| {
            DataSource::from_parts(name, value).map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if sources.is_empty() {
        return Err(AppError::BadRequest(
            "no data source given; use m.<Category>=<vpn>|<item>[|<metrics>]".to_string(),
        ));
    }
    Ok(sources)
}

async fn scrape(state: &AppState, endpoint: &str, sources: &[DataSource]) -> Response {
    let cycle = state.orchestrator.run(endpoint, sources).await;
    let output = transformer::render(&cycle, state.orchestrator.stats());

    debug!(
        endpoint = %endpoint,
        duration_ms = cycle.duration.as_millis() as u64,
        failures = cycle.failures(),
        bytes = output.len(),
        "Metrics collection complete"
    );

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        output,
    )
        .into_response()
}
