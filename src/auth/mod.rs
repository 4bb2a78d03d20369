//! Broker credentials
//!
//! Turns an [`AuthConfig`] into an [`AuthDecorator`] that stamps the
//! `Authorization` header onto outgoing SEMP requests. OAuth tokens come from
//! the client-credentials flow and are cached in a [`TokenCache`] owned by the
//! [`CredentialManager`].

mod token;

pub use token::{CachedToken, OAuthTokenResponse, TokenCache, MAX_TOKEN_LIFETIME, REFRESH_SKEW};

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, instrument};

use crate::config::{AuthConfig, AuthScheme};
use crate::error::AuthError;

/// Header decoration applied to every SEMP request, including redirected ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecorator {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

impl AuthDecorator {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            AuthDecorator::None => request,
            AuthDecorator::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthDecorator::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// Issues auth decorators for the broker-facing [`AuthConfig`]
#[derive(Debug, Clone)]
pub struct CredentialManager {
    config: Arc<AuthConfig>,
    client: Client,
    tokens: TokenCache,
}

impl CredentialManager {
    /// `client` is used for token requests and should carry the same TLS policy
    /// as broker calls.
    pub fn new(config: AuthConfig, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
            tokens: TokenCache::new(),
        }
    }

    /// Build the decorator for the configured scheme
    pub async fn obtain_decorator(&self) -> Result<AuthDecorator, AuthError> {
        match self.config.scheme {
            AuthScheme::None => Ok(AuthDecorator::None),
            AuthScheme::Basic => Ok(AuthDecorator::Basic {
                username: self.config.username.clone(),
                password: self.config.password.clone(),
            }),
            AuthScheme::OAuth => Ok(AuthDecorator::Bearer(self.get_token().await?)),
        }
    }

    /// Cached bearer token, refreshed when it is within [`REFRESH_SKEW`] of expiry
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.tokens.fresh().await {
            return Ok(token);
        }

        let _refreshing = self.tokens.refresh_lock().lock().await;
        // Another task may have refreshed while we waited.
        if let Some(token) = self.tokens.fresh().await {
            return Ok(token);
        }

        let issued_at = Instant::now();
        let response = self.request_token().await?;
        let token = CachedToken::from_response(&response, issued_at);
        let access_token = token.access_token.clone();
        self.tokens.store(token).await;

        debug!(
            token_type = %response.token_type,
            expires_in = response.expires_in,
            "OAuth token refreshed"
        );
        Ok(access_token)
    }

    #[instrument(skip(self), fields(token_url = %self.config.oauth_token_url))]
    async fn request_token(&self) -> Result<OAuthTokenResponse, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.oauth_client_id.as_str()),
            ("client_secret", self.config.oauth_client_secret.as_str()),
            ("scope", self.config.oauth_client_scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.oauth_token_url)
            .form(&form)
            .send()
            .await
            .map_err(AuthError::TokenRequest)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::TokenRequest)?;

        if status != StatusCode::OK {
            return Err(AuthError::TokenRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OAuthTokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::TokenDecode(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(scheme: AuthScheme) -> CredentialManager {
        let config = AuthConfig {
            scheme,
            username: "admin".to_string(),
            password: "secret".to_string(),
            ..AuthConfig::default()
        };
        CredentialManager::new(config, Client::new())
    }

    #[tokio::test]
    async fn test_none_scheme_is_noop() {
        let decorator = manager(AuthScheme::None).obtain_decorator().await.unwrap();
        assert_eq!(decorator, AuthDecorator::None);

        let request = decorator
            .apply(Client::new().get("http://localhost/SEMP"))
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_basic_scheme_sets_header() {
        let decorator = manager(AuthScheme::Basic).obtain_decorator().await.unwrap();
        let request = decorator
            .apply(Client::new().get("http://localhost/SEMP"))
            .build()
            .unwrap();
        // admin:secret
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Basic YWRtaW46c2VjcmV0"
        );
    }

    #[test]
    fn test_bearer_decorator_sets_header() {
        let request = AuthDecorator::Bearer("tok".to_string())
            .apply(Client::new().get("http://localhost/SEMP"))
            .build()
            .unwrap();
        assert_eq!(request.headers().get("authorization").unwrap(), "Bearer tok");
    }
}
