//! Basic authentication for scrapers of this exporter

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::AppState;
use crate::config::{AuthConfig, AuthScheme};

const CHALLENGE: &str = "Basic realm=\"restricted\"";

/// Rejects requests without matching Basic credentials when the exporter
/// auth scheme is `basic`; passes everything through otherwise.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let auth = &state.config.exporter_auth;
    if auth.scheme != AuthScheme::Basic {
        return next.run(req).await;
    }

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if header_value.is_some_and(|v| credentials_match(v, auth)) {
        return next.run(req).await;
    }

    tracing::warn!(
        path = %req.uri().path(),
        credentials_present = header_value.is_some(),
        "Request rejected: invalid exporter credentials"
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, CHALLENGE)],
        "Unauthorized",
    )
        .into_response()
}

fn credentials_match(header_value: &str, auth: &AuthConfig) -> bool {
    let Some(encoded) = header_value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((user, pass)) => user == auth.username && pass == auth.password,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            scheme: AuthScheme::Basic,
            username: "prom".to_string(),
            password: "s3cret:x".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_credentials_match() {
        let good = format!("Basic {}", STANDARD.encode("prom:s3cret:x"));
        assert!(credentials_match(&good, &auth()));

        let bad = format!("Basic {}", STANDARD.encode("prom:wrong"));
        assert!(!credentials_match(&bad, &auth()));
        assert!(!credentials_match("Bearer abc", &auth()));
        assert!(!credentials_match("Basic !!!", &auth()));
        let no_colon = format!("Basic {}", STANDARD.encode("prom"));
        assert!(!credentials_match(&no_colon, &auth()));
    }
}
