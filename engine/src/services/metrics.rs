//! In-memory metrics aggregation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::traits::EventEmitter;
use crate::types::EngineEvent;

/// Everything recorded so far
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub scenarios_started: u64,
    pub counters: HashMap<String, u64>,
    pub histograms: HashMap<String, Vec<f64>>,
}

/// Summary statistics of one histogram
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl HistogramSummary {
    fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Nearest-rank percentile of sorted samples
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Real metrics collector shared by every scenario run
#[derive(Clone, Default)]
pub struct RealMetricsCollector {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl RealMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    pub fn scenarios_started(&self) -> u64 {
        self.lock().scenarios_started
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    pub fn histogram_summary(&self, name: &str) -> Option<HistogramSummary> {
        let inner = self.lock();
        inner
            .histograms
            .get(name)
            .and_then(|samples| HistogramSummary::from_samples(samples))
    }

    /// Log a summary of everything recorded
    pub fn log_report(&self) {
        let snapshot = self.snapshot();
        info!("📊 Scenarios started: {}", snapshot.scenarios_started);

        let mut counters: Vec<_> = snapshot.counters.iter().collect();
        counters.sort();
        for (name, value) in counters {
            info!("📊 {}: {}", name, value);
        }

        let mut names: Vec<_> = snapshot.histograms.keys().collect();
        names.sort();
        for name in names {
            if let Some(summary) = HistogramSummary::from_samples(&snapshot.histograms[name]) {
                info!(
                    "📊 {}: count={} min={:.1} max={:.1} mean={:.1} p50={:.1} p95={:.1} p99={:.1}",
                    name, summary.count, summary.min, summary.max, summary.mean,
                    summary.p50, summary.p95, summary.p99
                );
            }
        }
    }
}

impl EventEmitter for RealMetricsCollector {
    fn emit(&self, event: EngineEvent) {
        let mut inner = self.lock();
        match event {
            EngineEvent::Started => inner.scenarios_started += 1,
            EngineEvent::Counter { name, value } => *inner.counters.entry(name).or_insert(0) += value,
            EngineEvent::Histogram { name, value } => inner.histograms.entry(name).or_default().push(value),
        }
    }
}
