//! Error types for solace-exporter
//!
//! This module defines the error types used throughout the application.
//! Configuration errors live next to the loader in [`crate::config`].

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Credential errors raised while building an auth decorator
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token endpoint could not be reached
    #[error("OAuth token request failed: {0}")]
    TokenRequest(#[source] reqwest::Error),

    /// The token endpoint answered with a non-200 status
    #[error("OAuth token endpoint returned {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    /// The token endpoint answered with a body that is not a token response
    #[error("Failed to decode OAuth token response: {0}")]
    TokenDecode(String),

    /// The token response carried an empty `access_token`
    #[error("access_token is empty in response")]
    EmptyToken,
}

/// Coarse classification of per-source failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Transport,
    Timeout,
    Decode,
    Filter,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Decode => "decode",
            ErrorKind::Filter => "filter",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SEMP scrape error. Every variant is isolated to the data source that raised it.
#[derive(Error, Debug)]
pub enum SempError {
    /// Credentials could not be obtained
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP client initialization failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// mTLS client certificate or key could not be read
    #[error("Failed to initialize HTTP client: cannot read {path}: {source}")]
    ClientIdentity {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Network or TLS failure
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Broker answered with a non-success HTTP status
    #[error("HTTP error status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Redirect chain exceeded the hop limit
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Source did not finish within the scrape timeout
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Response body could not be decoded
    #[error("Failed to decode {dialect} response: {message}")]
    Decode {
        dialect: &'static str,
        message: String,
    },

    /// SEMP v1 `execute-result` code other than "ok"
    #[error("Unexpected result code '{code}'")]
    UnexpectedResult { code: String },

    /// Requested item or metric is not in the allow-list
    #[error("item \"{name}\" is not valid. Please choose from: {}", .valid_choices.join(","))]
    UnknownItem {
        name: String,
        valid_choices: Vec<String>,
    },

    /// Data source names a category this exporter does not know
    #[error("Unknown data source category '{0}'")]
    UnknownCategory(String),
}

impl SempError {
    /// Map onto the failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            SempError::Auth(_) => ErrorKind::Auth,
            SempError::HttpStatus { status: 401 | 403, .. } => ErrorKind::Auth,
            SempError::Transport(e) if e.is_timeout() => ErrorKind::Timeout,
            SempError::HttpClientInit(_)
            | SempError::ClientIdentity { .. }
            | SempError::Transport(_)
            | SempError::HttpStatus { .. }
            | SempError::TooManyRedirects(_) => ErrorKind::Transport,
            SempError::Timeout(_) => ErrorKind::Timeout,
            SempError::Decode { .. } | SempError::UnexpectedResult { .. } => ErrorKind::Decode,
            SempError::UnknownItem { .. } | SempError::UnknownCategory(_) => ErrorKind::Filter,
        }
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        SempError::Decode {
            dialect: "SEMP v1 XML",
            message: err.to_string(),
        }
    }

    pub(crate) fn json(err: impl std::fmt::Display) -> Self {
        SempError::Decode {
            dialect: "SEMP v2 JSON",
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SempError {
    fn from(err: reqwest::Error) -> Self {
        SempError::Transport(err)
    }
}

/// Application error type returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// No endpoint with this name is configured
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Ad-hoc data sources could not be parsed from the query string
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, public_message, log_message) = match self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                e.to_string(),
            ),
            AppError::UnknownEndpoint(name) => (
                StatusCode::NOT_FOUND,
                format!("Unknown endpoint '{}'", name),
                format!("unknown endpoint {}", name),
            ),
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.clone(), e),
        };

        tracing::error!(status = %status, error = %log_message, "Request failed");

        (status, public_message).into_response()
    }
}

/// Result type alias for SEMP operations
pub type SempResult<T> = Result<T, SempError>;
