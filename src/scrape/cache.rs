//! Prefetch cache of successful per-source scrape results

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::ScrapeResult;

/// (endpoint name, data source string form)
pub type CacheKey = (String, String);

#[derive(Debug, Clone)]
struct Entry {
    result: ScrapeResult,
    stored_at: Instant,
}

/// Results younger than `interval` are served instead of re-scraping.
/// A zero interval disables the cache.
#[derive(Debug, Clone)]
pub struct PrefetchCache {
    interval: Duration,
    entries: Arc<RwLock<HashMap<CacheKey, Entry>>>,
}

impl PrefetchCache {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<ScrapeResult> {
        self.get_at(key, Instant::now()).await
    }

    async fn get_at(&self, key: &CacheKey, now: Instant) -> Option<ScrapeResult> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.interval)
            .map(|entry| entry.result.clone())
    }

    /// Store a result; failures are ignored
    pub async fn put(&self, key: CacheKey, result: &ScrapeResult) {
        if !self.is_enabled() || !result.success {
            return;
        }
        let interval = self.interval;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < interval);
        entries.insert(
            key,
            Entry {
                result: result.clone(),
                stored_at: now,
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
