//! Shared verdict cache with time-to-live
//!
//! Keys are `(source id, unordered pair)`. Only answers a source actually
//! gave are stored; an unavailable source is asked again on the next check.

use moka::future::Cache as MokaCache;
use rxsentry_domain::{DrugPair, VerdictOutcome};
use std::time::Duration;

/// TTL cache of raw source verdicts, cheap to clone and shared across checks
#[derive(Clone)]
pub struct VerdictCache {
    inner: MokaCache<(String, DrugPair), VerdictOutcome>,
}

impl VerdictCache {
    /// Create a cache holding at most `capacity` verdicts for `ttl` each
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: MokaCache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached verdict of `source` for `pair`, if still live
    pub async fn get(&self, source: &str, pair: &DrugPair) -> Option<VerdictOutcome> {
        self.inner.get(&(source.to_string(), pair.clone())).await
    }

    /// Store a verdict; unavailable outcomes are ignored
    pub async fn insert(&self, source: &str, pair: &DrugPair, outcome: VerdictOutcome) {
        if matches!(outcome, VerdictOutcome::Unavailable) {
            return;
        }
        self.inner.insert((source.to_string(), pair.clone()), outcome).await;
    }

    /// Drop every cached verdict
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
