//! Task counters and execution latency.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One hour in nanoseconds; longer tasks are clamped.
const MAX_TRACKED_LATENCY_NS: u64 = 3_600_000_000_000;

/// Per-manager metrics collector
#[derive(Debug)]
pub struct Metrics {
    tasks_spawned: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,
    tasks_not_started: AtomicU64,

    // `None` only if the histogram could not be allocated.
    latency_histogram: Option<RwLock<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_max(MAX_TRACKED_LATENCY_NS, 3)
            .ok()
            .map(RwLock::new);

        Self {
            tasks_spawned: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            tasks_not_started: AtomicU64::new(0),
            latency_histogram: histogram,
            start_time: Instant::now(),
        }
    }

    pub fn record_task_spawned(&self) {
        self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished task with its execution time
    pub fn record_task_completed(&self, duration_ns: u64) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);

        if let Some(histogram) = &self.latency_histogram {
            let _ = histogram.write().record(duration_ns.min(MAX_TRACKED_LATENCY_NS));
        }
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task whose thread could not be created
    pub fn record_task_not_started(&self) {
        self.tasks_not_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg, p50, p99, max) = match &self.latency_histogram {
            Some(histogram) => {
                let histogram = histogram.read();
                if histogram.is_empty() {
                    (0, 0, 0, 0)
                } else {
                    (
                        histogram.mean() as u64,
                        histogram.value_at_quantile(0.50),
                        histogram.value_at_quantile(0.99),
                        histogram.max(),
                    )
                }
            }
            None => (0, 0, 0, 0),
        };

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            tasks_spawned: self.tasks_spawned.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_not_started: self.tasks_not_started.load(Ordering::Relaxed),
            avg_latency_ns: avg,
            p50_latency_ns: p50,
            p99_latency_ns: p99,
            max_latency_ns: max,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub tasks_spawned: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_panicked: u64,
    pub tasks_not_started: u64,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Tasks spawned but neither completed nor refused a thread.
    pub fn in_flight(&self) -> u64 {
        self.tasks_spawned
            .saturating_sub(self.tasks_completed)
            .saturating_sub(self.tasks_not_started)
    }

    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_completed as f64 / seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = Metrics::new();

        metrics.record_task_spawned();
        metrics.record_task_spawned();
        metrics.record_task_completed(1000);
        metrics.record_task_failed();
        metrics.record_task_panic();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_spawned, 2);
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.tasks_failed, 1);
        assert_eq!(snapshot.tasks_panicked, 1);
        assert_eq!(snapshot.in_flight(), 1);
        assert!(snapshot.avg_latency_ns > 0);
    }

    #[test]
    fn test_not_started_leaves_flight() {
        let metrics = Metrics::new();

        metrics.record_task_spawned();
        metrics.record_task_not_started();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_not_started, 1);
        assert_eq!(snapshot.tasks_completed, 0);
        assert_eq!(snapshot.in_flight(), 0);
    }

    #[test]
    fn test_empty_latency() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.max_latency_ns, 0);
        assert_eq!(snapshot.tasks_per_second(), 0.0);
    }
}
