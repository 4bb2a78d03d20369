//! OAuth2 client-credentials token cache

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

/// Tokens are refreshed this long before they expire
pub const REFRESH_SKEW: Duration = Duration::from_secs(5 * 60);

/// Upper bound on a token lifetime reported by the token endpoint
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokenResponse {
    #[serde(default)]
    pub access_token: String,
    /// Lifetime in seconds. A missing value makes the token stale immediately.
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Access token paired with its expiry
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn from_response(response: &OAuthTokenResponse, issued_at: Instant) -> Self {
        Self {
            access_token: response.access_token.clone(),
            expires_at: issued_at
                + Duration::from_secs(response.expires_in).min(MAX_TOKEN_LIFETIME),
        }
    }

    /// Usable while `now < expires_at - REFRESH_SKEW`
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now + REFRESH_SKEW < self.expires_at
    }
}

/// Shared token slot.
///
/// The token and its expiry are replaced together under the write lock, so a
/// reader never sees one without the other. `refresh` serializes refreshers;
/// holders re-check the slot after acquiring it.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    slot: Arc<RwLock<Option<CachedToken>>>,
    refresh: Arc<Mutex<()>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached access token, if still fresh
    pub async fn fresh(&self) -> Option<String> {
        let now = Instant::now();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_fresh_at(now))
            .map(|token| token.access_token.clone())
    }

    pub async fn store(&self, token: CachedToken) {
        *self.slot.write().await = Some(token);
    }

    pub(crate) fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh
    }
}
