//! Dispatch metrics
//!
//! Process-wide counters go through the `metrics` facade (no-ops until a
//! recorder such as the Prometheus exporter is installed). Per-backend latency
//! statistics are kept in memory with [`RunningStats`].

use metrics::{counter, gauge, histogram};

/// Record a call enqueued for a backend
pub fn record_call_dispatched(backend: &str, op: &'static str) {
    counter!(
        "fanlog_calls_dispatched_total",
        "backend" => backend.to_string(),
        "op" => op
    )
    .increment(1);
}

/// Record a call dropped before reaching a backend
///
/// `reason` is `queue_full` or `worker_closed`.
pub fn record_call_dropped(backend: &str, op: &'static str, reason: &'static str) {
    counter!(
        "fanlog_calls_dropped_total",
        "backend" => backend.to_string(),
        "op" => op,
        "reason" => reason
    )
    .increment(1);
}

/// Record a call handled by a backend worker
pub fn record_call_handled(backend: &str, op: &'static str, duration_ms: f64, panicked: bool) {
    let status = if panicked { "panicked" } else { "ok" };
    counter!(
        "fanlog_calls_handled_total",
        "backend" => backend.to_string(),
        "op" => op,
        "status" => status
    )
    .increment(1);

    histogram!(
        "fanlog_backend_call_duration_ms",
        "backend" => backend.to_string()
    )
    .record(duration_ms);
}

/// Record the current depth of a backend queue
pub fn record_queue_depth(backend: &str, depth: usize) {
    gauge!(
        "fanlog_backend_queue_depth",
        "backend" => backend.to_string()
    )
    .set(depth as f64);
}

/// Record a log sink write attempt
pub fn record_sink_write(writer: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fanlog_sink_writes_total",
        "writer" => writer,
        "status" => status
    )
    .increment(1);
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = RunningStats::default().summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.to_string(), "N/A");
    }

    #[test]
    fn test_summary_display() {
        let mut stats = RunningStats::default();
        stats.push(0.5);
        stats.push(1.5);
        let output = stats.summary().to_string();
        assert!(output.contains("mean=1.000"));
        assert!(output.contains("(n=2)"));
    }

    #[test]
    fn test_recorders_without_exporter_are_noops() {
        record_call_dispatched("console", "report_event");
        record_call_dropped("console", "report_event", "queue_full");
        record_call_handled("console", "report_event", 0.2, false);
        record_queue_depth("console", 3);
        record_sink_write("stdout", true);
    }
}
