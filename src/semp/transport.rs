//! HTTP client construction for broker and token endpoint calls

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, ClientBuilder, Identity, Method, RequestBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthDecorator;
use crate::config::ScrapeConfig;
use crate::error::{SempError, SempResult};

/// Redirect hops followed by [`super::SempClient`] before giving up
pub const MAX_REDIRECTS: usize = 10;

/// Build the shared HTTP client.
///
/// Certificate verification follows `ssl_verify` only; listener TLS settings
/// have no effect here. Redirects are not followed by the client itself so the
/// SEMP client can re-apply credentials on every hop.
pub fn build_client(scrape: &ScrapeConfig) -> Result<Client, SempError> {
    let mut builder = ClientBuilder::new()
        .timeout(scrape.timeout())
        .connect_timeout(scrape.timeout())
        .pool_max_idle_per_host(scrape.parallel_semp_connections.max(1))
        .pool_idle_timeout(Duration::from_secs(30))
        .redirect(redirect::Policy::none())
        .danger_accept_invalid_certs(!scrape.ssl_verify);

    if !scrape.ssl_verify {
        warn!(
            broker = %scrape.uri,
            "Broker certificate verification is disabled; set ssl_verify to enable it"
        );
    }

    if let Some(identity) = load_client_identity(scrape)? {
        builder = builder.identity(identity);
    }

    builder.build().map_err(SempError::HttpClientInit)
}

fn load_client_identity(scrape: &ScrapeConfig) -> Result<Option<Identity>, SempError> {
    let (Some(cert_path), Some(key_path)) =
        (&scrape.client_certificate, &scrape.client_private_key)
    else {
        return Ok(None);
    };

    let read = |path: &str| {
        std::fs::read(path).map_err(|source| SempError::ClientIdentity {
            path: path.to_string(),
            source,
        })
    };

    let mut pem = read(key_path)?;
    pem.push(b'\n');
    pem.extend(read(cert_path)?);

    Identity::from_pem(&pem)
        .map(Some)
        .map_err(SempError::HttpClientInit)
}

/// A request that can be rebuilt for every redirect hop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
}

impl PendingRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
            content_type: None,
        }
    }

    pub fn post_xml(url: Url, body: String) -> Self {
        Self {
            method: Method::POST,
            url,
            body: Some(body),
            content_type: Some("application/xml"),
        }
    }

    /// Next hop for a redirect response.
    ///
    /// 301/302/303 turn anything but GET/HEAD into a body-less GET;
    /// 307/308 keep method and body.
    pub fn redirected(&self, status: StatusCode, location: &str) -> SempResult<Self> {
        let url = self.url.join(location).map_err(|e| SempError::HttpStatus {
            status: status.as_u16(),
            body: format!("invalid redirect location '{}': {}", location, e),
        })?;

        let keep_method = matches!(
            status,
            StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
        ) || self.method == Method::GET
            || self.method == Method::HEAD;

        if keep_method {
            Ok(Self {
                url,
                ..self.clone()
            })
        } else {
            Ok(Self::get(url))
        }
    }
}

/// Redirect re-authentication hook: a fresh builder for `request` carrying the
/// decorator's credentials
pub fn authorize(client: &Client, decorator: &AuthDecorator, request: &PendingRequest) -> RequestBuilder {
    let mut builder = client.request(request.method.clone(), request.url.clone());
    if let Some(content_type) = request.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }
    decorator.apply(builder)
}

/// Execute `request`, following up to [`MAX_REDIRECTS`] redirects, and return
/// the body of the final 2xx response
pub async fn execute(
    client: &Client,
    decorator: &AuthDecorator,
    mut request: PendingRequest,
) -> SempResult<String> {
    for _ in 0..=MAX_REDIRECTS {
        let response = authorize(client, decorator, &request).send().await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| SempError::HttpStatus {
                    status: status.as_u16(),
                    body: "redirect without Location header".to_string(),
                })?;
            let next = request.redirected(status, location)?;
            debug!(from = %request.url, to = %next.url, status = status.as_u16(), "Following redirect");
            request = next;
            continue;
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SempError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        return Ok(body);
    }

    Err(SempError::TooManyRedirects(MAX_REDIRECTS))
}
