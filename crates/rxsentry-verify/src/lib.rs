//! RxSentry External Verification
//!
//! Cross-checks catalog interactions against external sources and fuses the
//! answers into a confidence score.
//!
//! # Architecture
//!
//! - [`VerdictProvider`]: one async trait per source, returning a tagged outcome
//! - [`VerdictCache`]: raw verdicts cached by (source, unordered pair) with a TTL
//! - [`ConfidenceAggregator`]: fans out one task per source per pair with a
//!   timeout, then applies the confidence rules from `rxsentry-domain`
//!
//! A source that errors, times out or is absent counts as "did not match";
//! verification never fails a check.

#![warn(missing_docs)]

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod openfda;
pub mod rxnorm;

pub use aggregator::{ConfidenceAggregator, PairConfidence};
pub use cache::VerdictCache;
pub use config::{SourceConfig, VerifyConfig};
pub use error::VerifyError;
pub use metrics::{MetricsSnapshot, VerifyMetrics};
pub use openfda::OpenFdaProvider;
pub use rxnorm::RxNormProvider;

use async_trait::async_trait;
use rxsentry_domain::{Drug, DrugPair, SourceAuthority, VerdictOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An external source that can confirm a drug pair interacts
#[async_trait]
pub trait VerdictProvider: Send + Sync {
    /// Stable source identifier, also the cache namespace
    fn source_id(&self) -> &str;

    /// How much a lone match from this source is trusted
    fn authority(&self) -> SourceAuthority;

    /// Look the pair up; `Ok` carries `Matched` or `NotMatched`
    async fn verify(&self, a: &Drug, b: &Drug) -> Result<VerdictOutcome, VerifyError>;
}

/// Mock verification source for deterministic testing
///
/// Outcomes are keyed by unordered pair; unknown pairs get the default
/// outcome. Clones share the call counter.
#[derive(Debug, Clone)]
pub struct MockVerdictProvider {
    source_id: String,
    authority: SourceAuthority,
    default_outcome: VerdictOutcome,
    outcomes: HashMap<DrugPair, VerdictOutcome>,
    delay: Option<Duration>,
    failing: Arc<AtomicBool>,
    call_count: Arc<AtomicUsize>,
}

impl MockVerdictProvider {
    /// Create a mock that answers `NotMatched` for every pair
    pub fn new(source_id: impl Into<String>, authority: SourceAuthority) -> Self {
        Self {
            source_id: source_id.into(),
            authority,
            default_outcome: VerdictOutcome::NotMatched,
            outcomes: HashMap::new(),
            delay: None,
            failing: Arc::new(AtomicBool::new(false)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `outcome` for every pair without a specific entry
    pub fn with_default(mut self, outcome: VerdictOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Answer `outcome` for the unordered pair `(a, b)`
    pub fn with_outcome(mut self, a: &str, b: &str, outcome: VerdictOutcome) -> Self {
        self.outcomes.insert(DrugPair::new(a.into(), b.into()), outcome);
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Toggle failure mode
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times verify was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerdictProvider for MockVerdictProvider {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn authority(&self) -> SourceAuthority {
        self.authority
    }

    async fn verify(&self, a: &Drug, b: &Drug) -> Result<VerdictOutcome, VerifyError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(VerifyError::Http("Mock source unavailable".to_string()));
        }

        let pair = DrugPair::new(a.id.clone(), b.id.clone());
        Ok(self.outcomes.get(&pair).copied().unwrap_or(self.default_outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_outcomes_are_unordered() {
        let provider = MockVerdictProvider::new("mock", SourceAuthority::High).with_outcome(
            "B",
            "A",
            VerdictOutcome::Matched { strength: 3.0 },
        );

        let a = Drug::new("A", "Alpha");
        let b = Drug::new("B", "Beta");
        let c = Drug::new("C", "Gamma");

        assert!(provider.verify(&a, &b).await.unwrap().is_match());
        assert!(provider.verify(&b, &a).await.unwrap().is_match());
        assert_eq!(provider.verify(&a, &c).await.unwrap(), VerdictOutcome::NotMatched);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let provider = MockVerdictProvider::new("mock", SourceAuthority::Low);
        let clone = provider.clone();
        clone.set_failing(true);

        let a = Drug::new("A", "Alpha");
        let b = Drug::new("B", "Beta");
        assert!(provider.verify(&a, &b).await.is_err());
        assert_eq!(clone.call_count(), 1);
    }
}
