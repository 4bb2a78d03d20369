//! Scrape orchestration
//!
//! One cycle fans out over the data sources of an endpoint, admits at most
//! `parallel_semp_connections` broker requests at a time, bounds every source by
//! the scrape timeout and folds the per-source outcomes back in source order. A
//! failing source only affects its own `up` gauge.

pub mod cache;

pub use cache::{CacheKey, PrefetchCache};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use crate::config::{Config, DataSource};
use crate::error::{ErrorKind, SempError, SempResult};
use crate::metrics::ExporterStats;
use crate::semp::{Category, MetricTuple};

/// Something that can scrape one data source
#[async_trait]
pub trait SourceScraper: Send + Sync {
    async fn scrape(&self, source: &DataSource) -> SempResult<Vec<MetricTuple>>;
}

/// Phases of one scrape cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

/// Why a source failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SempError> for ScrapeFailure {
    fn from(err: &SempError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one data source in one cycle
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub source: DataSource,
    pub success: bool,
    pub tuples: Vec<MetricTuple>,
    pub duration: Duration,
    pub error: Option<ScrapeFailure>,
    /// Served from the prefetch cache
    pub cached: bool,
}

impl ScrapeResult {
    fn ok(source: DataSource, tuples: Vec<MetricTuple>, duration: Duration) -> Self {
        Self {
            source,
            success: true,
            tuples,
            duration,
            error: None,
            cached: false,
        }
    }

    fn failed(source: DataSource, err: &SempError, duration: Duration) -> Self {
        Self {
            source,
            success: false,
            tuples: Vec::new(),
            duration,
            error: Some(err.into()),
            cached: false,
        }
    }

    fn aborted(source: DataSource, message: String) -> Self {
        Self {
            source,
            success: false,
            tuples: Vec::new(),
            duration: Duration::ZERO,
            error: Some(ScrapeFailure {
                kind: ErrorKind::Transport,
                message,
            }),
            cached: false,
        }
    }

    /// 1.0 when the source was scraped and decoded
    pub fn up(&self) -> f64 {
        if self.success {
            1.0
        } else {
            0.0
        }
    }
}

/// All results of one cycle, in source order
#[derive(Debug)]
pub struct ScrapeCycle {
    pub endpoint: String,
    pub results: Vec<ScrapeResult>,
    /// Sources whose category does not apply to the broker type
    pub skipped: usize,
    pub duration: Duration,
}

impl ScrapeCycle {
    /// True when every applicable source succeeded
    pub fn all_up(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Per-cycle policy derived from the scrape configuration
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub parallel: usize,
    pub timeout: Duration,
    pub slow_threshold: Duration,
    pub warn_slow: bool,
    pub is_hw_broker: bool,
    pub prefetch_interval: Duration,
}

impl ScrapeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parallel: config.scrape.parallel_semp_connections.max(1),
            timeout: config.scrape.timeout(),
            slow_threshold: config.scrape.slow_threshold(),
            warn_slow: config.log_broker_to_slow_warnings,
            is_hw_broker: config.scrape.is_hw_broker,
            prefetch_interval: config.scrape.prefetch_interval(),
        }
    }
}

/// Runs scrape cycles against one broker
#[derive(Clone)]
pub struct Orchestrator {
    scraper: Arc<dyn SourceScraper>,
    settings: ScrapeSettings,
    semaphore: Arc<Semaphore>,
    cache: PrefetchCache,
    stats: Arc<ExporterStats>,
}

impl Orchestrator {
    /// The admission semaphore is shared by every cycle of this orchestrator,
    /// so concurrent cycles together stay within the connection bound.
    pub fn new(scraper: Arc<dyn SourceScraper>, settings: ScrapeSettings) -> Self {
        Self {
            scraper,
            semaphore: Arc::new(Semaphore::new(settings.parallel.max(1))),
            cache: PrefetchCache::new(settings.prefetch_interval),
            stats: Arc::new(ExporterStats::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &ScrapeSettings {
        &self.settings
    }

    pub fn stats(&self) -> &ExporterStats {
        &self.stats
    }

    /// Run one cycle over `sources`. Per-source failures never fail the cycle.
    #[instrument(skip(self, sources), fields(endpoint = %endpoint, sources = sources.len()))]
    pub async fn run(&self, endpoint: &str, sources: &[DataSource]) -> ScrapeCycle {
        let started = Instant::now();
        let mut phase = CyclePhase::Idle;
        debug!(?phase, "Starting scrape cycle");

        phase = CyclePhase::Dispatching;
        debug!(?phase, parallel = self.settings.parallel, "Dispatching data sources");

        let mut pending = Vec::with_capacity(sources.len());
        let mut skipped = 0;
        for source in sources {
            let category = match source.name.parse::<Category>() {
                Ok(category) => category,
                Err(e) => {
                    error!(data_source = %source.name, kind = %e.kind(), error = %e, "Rejected data source");
                    pending.push(Pending::Done(ScrapeResult::failed(
                        source.clone(),
                        &e,
                        Duration::ZERO,
                    )));
                    continue;
                }
            };

            if !category.applies_to(self.settings.is_hw_broker) {
                debug!(
                    data_source = %source.name,
                    is_hw_broker = self.settings.is_hw_broker,
                    "Category does not apply to this broker type, skipping"
                );
                skipped += 1;
                continue;
            }

            let key: CacheKey = (endpoint.to_string(), source.to_string());
            if let Some(mut hit) = self.cache.get(&key).await {
                debug!(data_source = %source.name, "Serving data source from prefetch cache");
                hit.cached = true;
                pending.push(Pending::Done(hit));
                continue;
            }

            let task = tokio::spawn(scrape_one(
                Arc::clone(&self.scraper),
                Arc::clone(&self.semaphore),
                source.clone(),
                self.settings.clone(),
            ));
            pending.push(Pending::Running(source.clone(), category, key, task));
        }

        phase = CyclePhase::Collecting;
        debug!(?phase, "Collecting results");

        let mut results = Vec::with_capacity(pending.len());
        for item in pending {
            let result = match item {
                Pending::Done(result) => result,
                Pending::Running(source, category, key, task) => {
                    let result = match task.await {
                        Ok(result) => result,
                        Err(e) => {
                            error!(data_source = %source.name, error = %e, "Scrape task failed");
                            ScrapeResult::aborted(source, format!("scrape task failed: {}", e))
                        }
                    };
                    self.cache.put(key, &result).await;
                    self.stats.record(category, result.success);
                    result
                }
            };
            results.push(result);
        }

        phase = CyclePhase::Done;
        let cycle = ScrapeCycle {
            endpoint: endpoint.to_string(),
            results,
            skipped,
            duration: started.elapsed(),
        };
        debug!(
            ?phase,
            failures = cycle.failures(),
            skipped = cycle.skipped,
            duration_ms = cycle.duration.as_millis() as u64,
            "Scrape cycle finished"
        );
        cycle
    }
}

enum Pending {
    Done(ScrapeResult),
    Running(DataSource, Category, CacheKey, tokio::task::JoinHandle<ScrapeResult>),
}

async fn scrape_one(
    scraper: Arc<dyn SourceScraper>,
    semaphore: Arc<Semaphore>,
    source: DataSource,
    settings: ScrapeSettings,
) -> ScrapeResult {
    let Ok(_permit) = semaphore.acquire().await else {
        return ScrapeResult::aborted(source, "connection semaphore closed".to_string());
    };

    let started = Instant::now();
    let outcome = match timeout(settings.timeout, scraper.scrape(&source)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SempError::Timeout(settings.timeout)),
    };
    let duration = started.elapsed();

    if settings.warn_slow && duration > settings.slow_threshold {
        warn!(
            data_source = %source.name,
            vpn_filter = %source.vpn_filter,
            item_filter = %source.item_filter,
            duration_ms = duration.as_millis() as u64,
            threshold_ms = settings.slow_threshold.as_millis() as u64,
            "Slow broker response"
        );
    }

    match outcome {
        Ok(tuples) => {
            debug!(
                data_source = %source.name,
                tuples = tuples.len(),
                duration_ms = duration.as_millis() as u64,
                "Data source scraped"
            );
            ScrapeResult::ok(source, tuples, duration)
        }
        Err(e) => {
            error!(
                data_source = %source.name,
                vpn_filter = %source.vpn_filter,
                item_filter = %source.item_filter,
                kind = %e.kind(),
                error = %e,
                "Data source scrape failed"
            );
            ScrapeResult::failed(source, &e, duration)
        }
    }
}
