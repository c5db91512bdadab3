//! Telemetry for task managers.
//!
//! With the `telemetry` feature every manager keeps counters and an
//! execution-latency histogram. Without it the same API records nothing.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self { Self }
        pub fn record_task_spawned(&self) {}
        pub fn record_task_completed(&self, _: u64) {}
        pub fn record_task_failed(&self) {}
        pub fn record_task_panic(&self) {}
        pub fn record_task_not_started(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot { MetricsSnapshot::default() }
    }

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
        pub fn in_flight(&self) -> u64 { 0 }
        pub fn tasks_per_second(&self) -> f64 { 0.0 }
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
