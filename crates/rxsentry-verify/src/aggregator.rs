//! Confidence aggregation across verification sources
//!
//! For every pair, cached verdicts are reused and the remaining sources are
//! queried concurrently, one task each in a `JoinSet`, every call bounded by
//! the configured timeout. Pairs are themselves verified concurrently.
//! Dropping the returned future aborts every in-flight call.

use crate::{VerdictCache, VerdictProvider, VerifyConfig, VerifyMetrics};
use rxsentry_domain::confidence::{compute_confidence, confirming_sources, ConfidenceConfig};
use rxsentry_domain::{ConfidenceScore, Drug, DrugPair, ExternalVerdict, VerdictOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Fused verification result for one pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairConfidence {
    /// The pair that was verified
    pub pair: DrugPair,
    /// One verdict per configured source, in provider order
    pub verdicts: Vec<ExternalVerdict>,
    /// Fused confidence
    pub score: ConfidenceScore,
    /// Sources that matched, without duplicates
    pub confirmed_by: Vec<String>,
}

impl PairConfidence {
    /// Sources that gave an answer (matched or not)
    pub fn answered_sources(&self) -> impl Iterator<Item = &str> {
        self.verdicts
            .iter()
            .filter(|v| !matches!(v.outcome, VerdictOutcome::Unavailable))
            .map(|v| v.source.as_str())
    }
}

/// Fans pair lookups out to every source and applies the confidence rules
///
/// Cheap to clone; clones share providers, cache and metrics.
#[derive(Clone)]
pub struct ConfidenceAggregator {
    providers: Vec<Arc<dyn VerdictProvider>>,
    cache: VerdictCache,
    timeout: Duration,
    confidence: ConfidenceConfig,
    metrics: Arc<VerifyMetrics>,
}

impl ConfidenceAggregator {
    /// Create an aggregator over `providers`
    pub fn new(providers: Vec<Arc<dyn VerdictProvider>>, config: &VerifyConfig) -> Self {
        Self {
            providers,
            cache: VerdictCache::new(config.cache_capacity, config.cache_ttl()),
            timeout: config.timeout(),
            confidence: config.confidence(),
            metrics: Arc::new(VerifyMetrics::new()),
        }
    }

    /// Aggregator with no sources; every local match scores as unconfirmed
    pub fn without_sources() -> Self {
        Self::new(Vec::new(), &VerifyConfig::default())
    }

    /// Identifiers of the configured sources, in provider order
    pub fn source_ids(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.source_id().to_string()).collect()
    }

    /// Shared counters
    pub fn metrics(&self) -> &VerifyMetrics {
        &self.metrics
    }

    /// Shared verdict cache
    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Verify one pair that the local catalog already matched
    pub async fn verify_pair(&self, a: &Drug, b: &Drug) -> PairConfidence {
        let pair = DrugPair::new(a.id.clone(), b.id.clone());
        let mut outcomes: Vec<Option<VerdictOutcome>> = vec![None; self.providers.len()];
        let mut tasks = JoinSet::new();

        for (index, provider) in self.providers.iter().enumerate() {
            if let Some(cached) = self.cache.get(provider.source_id(), &pair).await {
                self.metrics.record_cache_hit();
                outcomes[index] = Some(cached);
                continue;
            }

            self.metrics.record_call();
            let provider = Arc::clone(provider);
            let (a, b) = (a.clone(), b.clone());
            let timeout = self.timeout;
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, provider.verify(&a, &b)).await;
                (index, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, pair = %pair, "Verification task failed");
                    self.metrics.record_failure();
                    continue;
                }
            };
            let source = self.providers[index].source_id();

            match result {
                Ok(Ok(outcome)) => {
                    self.cache.insert(source, &pair, outcome).await;
                    outcomes[index] = Some(outcome);
                }
                Ok(Err(e)) => {
                    debug!(source, pair = %pair, error = %e, "Source unavailable");
                    self.metrics.record_failure();
                }
                Err(_) => {
                    warn!(source, pair = %pair, timeout_ms = self.timeout.as_millis() as u64, "Source timed out");
                    self.metrics.record_timeout();
                }
            }
        }

        let verdicts: Vec<ExternalVerdict> = self
            .providers
            .iter()
            .zip(outcomes)
            .map(|(provider, outcome)| {
                ExternalVerdict::new(
                    provider.source_id(),
                    provider.authority(),
                    outcome.unwrap_or(VerdictOutcome::Unavailable),
                )
            })
            .collect();

        let score = compute_confidence(true, &verdicts, &self.confidence);
        let confirmed_by = confirming_sources(&verdicts);
        debug!(pair = %pair, confidence = %score, confirmed = confirmed_by.len(), "Pair verified");

        PairConfidence {
            pair,
            verdicts,
            score,
            confirmed_by,
        }
    }

    /// Verify many pairs concurrently; results follow input order
    pub async fn verify_all(&self, pairs: Vec<(Drug, Drug)>) -> Vec<PairConfidence> {
        if self.providers.is_empty() {
            let mut results = Vec::with_capacity(pairs.len());
            for (a, b) in &pairs {
                results.push(self.verify_pair(a, b).await);
            }
            return results;
        }

        let count = pairs.len();
        let mut tasks = JoinSet::new();
        for (index, (a, b)) in pairs.iter().cloned().enumerate() {
            let aggregator = self.clone();
            tasks.spawn(async move { (index, aggregator.verify_pair(&a, &b).await) });
        }

        let mut results: Vec<Option<PairConfidence>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, confidence)) => results[index] = Some(confidence),
                Err(e) => warn!(error = %e, "Pair verification task failed"),
            }
        }

        // A pair whose task died is treated as unverified by every source
        let mut ordered = Vec::with_capacity(count);
        for (result, (a, b)) in results.into_iter().zip(pairs) {
            ordered.push(match result {
                Some(confidence) => confidence,
                None => self.unverified(&a, &b),
            });
        }
        ordered
    }

    fn unverified(&self, a: &Drug, b: &Drug) -> PairConfidence {
        let verdicts: Vec<ExternalVerdict> = self
            .providers
            .iter()
            .map(|p| ExternalVerdict::unavailable(p.source_id(), p.authority()))
            .collect();
        PairConfidence {
            pair: DrugPair::new(a.id.clone(), b.id.clone()),
            score: compute_confidence(true, &verdicts, &self.confidence),
            verdicts,
            confirmed_by: Vec::new(),
        }
    }
}
