//! Logger metrics for observability
//!
//! Counters for delivered, filtered and dropped messages, sink failures and
//! file rotations.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use pipeline_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.delivered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Messages that reached every sink their level was gated into
    delivered: AtomicU64,

    /// Messages rejected by both level gates before rendering
    filtered: AtomicU64,

    /// Messages refused because the async pipeline was shutting down
    dropped: AtomicU64,

    /// Individual sink writes that failed (file open, rotation or write errors)
    sink_failures: AtomicU64,

    /// Successful log file rotations
    rotations: AtomicU64,

    /// Attempts to log at `LogLevel::None`
    misuse: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            misuse: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misuse_count(&self) -> u64 {
        self.misuse.load(Ordering::Relaxed)
    }

    /// Record a delivered message; returns the previous count
    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_misuse(&self) -> u64 {
        self.misuse.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been delivered or dropped yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.delivered_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
        self.misuse.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            delivered: AtomicU64::new(self.delivered_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            rotations: AtomicU64::new(self.rotations()),
            misuse: AtomicU64::new(self.misuse_count()),
        }
    }
}

/// Whether the n-th (0-based) occurrence of a repeated failure should be reported.
///
/// Reports the first one and every 1000th after it.
#[inline]
pub(crate) fn should_alert(previous_count: u64) -> bool {
    previous_count == 0 || (previous_count + 1) % 1000 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.delivered_count(), 0);
        assert_eq!(metrics.filtered_count(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.sink_failures(), 0);
        assert_eq!(metrics.rotations(), 0);
        assert_eq!(metrics.misuse_count(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_delivered();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_rotation();
        metrics.record_misuse();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.rotations(), 0);
        assert_eq!(snapshot.rotations(), 1);
        assert_eq!(snapshot.misuse_count(), 1);
    }

    #[test]
    fn test_alert_throttle() {
        assert!(should_alert(0));
        assert!(!should_alert(1));
        assert!(!should_alert(500));
        assert!(should_alert(999));
        assert!(should_alert(1999));
    }
}
