//! Run metrics.
//!
//! Collected in-memory while a run executes and logged as a snapshot at the
//! end of the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [10, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Slower than every bound
        self.buckets[Self::BUCKET_BOUNDS.len() - 1].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Metrics for one curation run.
#[derive(Debug, Default)]
pub struct RunMetrics {
    // Selection
    pub items_fetched: Counter,
    pub items_selected: Counter,
    pub items_backfilled: Counter,

    // History
    pub history_marked: Counter,
    pub history_evicted: Counter,

    // Enrichment
    pub stages_applied: Counter,
    pub stages_skipped: Counter,
    pub item_transforms_ok: Counter,
    pub item_transforms_failed: Counter,
    pub item_transform_latency_ms: Histogram,

    // Merge
    pub items_matched: Counter,
    pub items_published: Counter,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of run metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub items_fetched: u64,
    pub items_selected: u64,
    pub items_backfilled: u64,
    pub history_marked: u64,
    pub history_evicted: u64,
    pub stages_applied: u64,
    pub stages_skipped: u64,
    pub item_transforms_ok: u64,
    pub item_transforms_failed: u64,
    pub item_transform_latency_mean_ms: f64,
    pub items_matched: u64,
    pub items_published: u64,
}

impl RunMetrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> RunMetricsSnapshot {
        RunMetricsSnapshot {
            timestamp: Utc::now(),
            items_fetched: self.items_fetched.get(),
            items_selected: self.items_selected.get(),
            items_backfilled: self.items_backfilled.get(),
            history_marked: self.history_marked.get(),
            history_evicted: self.history_evicted.get(),
            stages_applied: self.stages_applied.get(),
            stages_skipped: self.stages_skipped.get(),
            item_transforms_ok: self.item_transforms_ok.get(),
            item_transforms_failed: self.item_transforms_failed.get(),
            item_transform_latency_mean_ms: self.item_transform_latency_ms.mean(),
            items_matched: self.items_matched.get(),
            items_published: self.items_published.get(),
        }
    }

    /// Logs the current snapshot as one structured line.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!(
            fetched = s.items_fetched,
            selected = s.items_selected,
            backfilled = s.items_backfilled,
            marked = s.history_marked,
            evicted = s.history_evicted,
            stages_applied = s.stages_applied,
            stages_skipped = s.stages_skipped,
            transforms_ok = s.item_transforms_ok,
            transforms_failed = s.item_transforms_failed,
            transform_mean_ms = s.item_transform_latency_mean_ms,
            matched = s.items_matched,
            published = s.items_published,
            "Run metrics"
        );
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<RunMetrics> = std::sync::LazyLock::new(RunMetrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static RunMetrics {
    &METRICS
}
