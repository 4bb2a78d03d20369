//! Internal observability metrics for solace-exporter
//!
//! Cumulative counters about the exporter's own operation, rendered after the
//! broker metrics of every cycle.
//!
//! # Metrics
//!
//! - `solace_exporter_scrapes_total{data_source="...",result="success|failure"}`

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::semp::Category;

/// Thread-safe counter using atomic operations
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter initialized to 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Per data source scrape outcome counters
#[derive(Debug, Default)]
pub struct SourceCounters {
    pub success: Counter,
    pub failure: Counter,
}

/// One rendered counter sample
#[derive(Debug, Clone, PartialEq)]
pub struct StatSample {
    pub data_source: &'static str,
    pub result: &'static str,
    pub value: u64,
}

/// Registry of per data source counters, keyed by canonical category name
#[derive(Debug, Default)]
pub struct ExporterStats {
    sources: RwLock<BTreeMap<&'static str, SourceCounters>>,
}

impl ExporterStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scrape outcome
    pub fn record(&self, category: Category, success: bool) {
        let name = category.name();
        {
            let sources = self.sources.read().expect("RwLock poisoned");
            if let Some(counters) = sources.get(name) {
                Self::bump(counters, success);
                return;
            }
        }

        let mut sources = self.sources.write().expect("RwLock poisoned");
        let counters = sources.entry(name).or_default();
        Self::bump(counters, success);
    }

    fn bump(counters: &SourceCounters, success: bool) {
        if success {
            counters.success.inc();
        } else {
            counters.failure.inc();
        }
    }

    /// Snapshot of every counter, ordered by data source then result
    pub fn samples(&self) -> Vec<StatSample> {
        let sources = self.sources.read().expect("RwLock poisoned");
        sources
            .iter()
            .flat_map(|(&name, counters)| {
                [
                    StatSample {
                        data_source: name,
                        result: "failure",
                        value: counters.failure.get(),
                    },
                    StatSample {
                        data_source: name,
                        result: "success",
                        value: counters.success.get(),
                    },
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_record_and_samples() {
        let stats = ExporterStats::new();
        stats.record(Category::VpnStats, true);
        stats.record(Category::VpnStats, true);
        stats.record(Category::BridgeStats, false);

        let samples = stats.samples();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].data_source, "BridgeStats");
        assert_eq!(samples[0].result, "failure");
        assert_eq!(samples[0].value, 1);
        assert_eq!(samples[3].data_source, "VpnStats");
        assert_eq!(samples[3].result, "success");
        assert_eq!(samples[3].value, 2);
    }

    #[test]
    fn test_concurrent_record() {
        let stats = Arc::new(ExporterStats::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record(Category::QueueDetails, true);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let samples = stats.samples();
        assert_eq!(samples[1].value, 1000);
    }
}
