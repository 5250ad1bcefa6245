//! Backend metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use observability::{RunningStats, StatsSummary};

/// Metrics for a single backend
#[derive(Debug, Default)]
pub struct BackendMetrics {
    /// Calls queued but not yet taken by the worker
    queue_len: AtomicUsize,
    /// Calls handed to the backend
    delivered_count: AtomicU64,
    /// Calls dropped because the queue was full or the worker gone
    dropped_count: AtomicU64,
    /// Calls during which the backend panicked
    panic_count: AtomicU64,
    /// Time the backend spent per call (ms)
    latency_ms: Mutex<RunningStats>,
}

impl BackendMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Count a call about to be queued
    pub fn inc_queue_len(&self) {
        self.queue_len.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a call leaving the queue (taken by the worker or rejected)
    pub fn dec_queue_len(&self) {
        let _ = self
            .queue_len
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |len| {
                len.checked_sub(1)
            });
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn inc_panic_count(&self) {
        self.panic_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long one backend call took
    pub fn record_latency(&self, elapsed: Duration) {
        self.latency_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(elapsed.as_secs_f64() * 1000.0);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            delivered_count: self.delivered_count(),
            dropped_count: self.dropped_count(),
            panic_count: self.panic_count(),
            latency_ms: self
                .latency_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .summary(),
        }
    }
}

/// Snapshot of backend metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub delivered_count: u64,
    pub dropped_count: u64,
    pub panic_count: u64,
    pub latency_ms: StatsSummary,
}
