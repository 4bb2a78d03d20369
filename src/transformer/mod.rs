//! Scrape cycle to Prometheus exposition
//!
//! Successful sources contribute their decoded tuples in source order; every
//! applicable source then gets its `up` and duration gauges, followed by the
//! cycle-wide and exporter-internal families.

pub mod formatter;

pub use formatter::PrometheusFormatter;

use crate::metrics::ExporterStats;
use crate::scrape::ScrapeCycle;
use crate::semp::{MetricDesc, MetricTuple};

const SOURCE_LABELS: &[&str] = &["data_source", "vpn_filter", "item_filter"];

pub static DATA_SOURCE_UP: MetricDesc = MetricDesc::gauge(
    "data_source_up",
    "Data source was scraped and decoded successfully (0/1).",
    SOURCE_LABELS,
);

pub static DATA_SOURCE_DURATION: MetricDesc = MetricDesc::gauge(
    "data_source_scrape_duration_seconds",
    "Duration of the data source scrape.",
    SOURCE_LABELS,
);

pub static UP: MetricDesc = MetricDesc::gauge(
    "up",
    "All applicable data sources of the endpoint were scraped (0/1).",
    &[],
);

pub static EXPORTER_INFO: MetricDesc =
    MetricDesc::gauge("exporter_info", "Exporter build information.", &["version"]);

pub static SCRAPES_TOTAL: MetricDesc = MetricDesc::counter(
    "exporter_scrapes_total",
    "Data source scrapes by result.",
    &["data_source", "result"],
);

/// Render one cycle plus the exporter's own counters
pub fn render(cycle: &ScrapeCycle, stats: &ExporterStats) -> String {
    let mut extra = Vec::with_capacity(cycle.results.len() * 2 + 2);

    for result in &cycle.results {
        let labels = vec![
            result.source.name.clone(),
            result.source.vpn_filter.clone(),
            result.source.item_filter.clone(),
        ];
        extra.push(MetricTuple {
            desc: &DATA_SOURCE_UP,
            value: result.up(),
            labels: labels.clone(),
        });
        extra.push(MetricTuple {
            desc: &DATA_SOURCE_DURATION,
            value: result.duration.as_secs_f64(),
            labels,
        });
    }

    extra.push(MetricTuple {
        desc: &UP,
        value: if cycle.all_up() { 1.0 } else { 0.0 },
        labels: Vec::new(),
    });
    extra.push(MetricTuple {
        desc: &EXPORTER_INFO,
        value: 1.0,
        labels: vec![env!("CARGO_PKG_VERSION").to_string()],
    });
    extra.extend(stats.samples().into_iter().map(|s| MetricTuple {
        desc: &SCRAPES_TOTAL,
        value: s.value as f64,
        labels: vec![s.data_source.to_string(), s.result.to_string()],
    }));

    let decoded = cycle
        .results
        .iter()
        .filter(|r| r.success)
        .flat_map(|r| r.tuples.iter());

    PrometheusFormatter::new().format(decoded.chain(extra.iter()))
}
