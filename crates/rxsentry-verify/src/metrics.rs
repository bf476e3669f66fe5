//! Counters for external verification
//!
//! Updated from concurrent tasks, so every counter is atomic.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live verification counters
#[derive(Debug, Default)]
pub struct VerifyMetrics {
    provider_calls: AtomicU64,
    cache_hits: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`VerifyMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls made to providers
    pub provider_calls: u64,
    /// Verdicts served from cache
    pub cache_hits: u64,
    /// Calls abandoned after the timeout
    pub timeouts: u64,
    /// Calls that returned an error or panicked
    pub failures: u64,
}

impl VerifyMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a provider call
    pub fn record_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache hit
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timed-out call
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.provider_calls.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}

impl MetricsSnapshot {
    /// Fraction of lookups served from cache, 0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.provider_calls + self.cache_hits;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Verification Metrics Summary".to_string(),
            format!("Provider calls: {}", self.provider_calls),
            format!("Cache hits: {}", self.cache_hits),
            format!("Timeouts: {}", self.timeouts),
            format!("Failures: {}", self.failures),
            format!("Hit rate: {:.1}%", self.hit_rate() * 100.0),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = VerifyMetrics::new();
        metrics.record_call();
        metrics.record_call();
        metrics.record_cache_hit();
        metrics.record_timeout();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.provider_calls, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.failures, 1);
        assert!((snapshot.hit_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_and_summary() {
        let metrics = VerifyMetrics::new();
        metrics.record_call();
        assert!(metrics.snapshot().summary().contains("Provider calls: 1"));

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.snapshot().hit_rate(), 0.0);
    }
}
