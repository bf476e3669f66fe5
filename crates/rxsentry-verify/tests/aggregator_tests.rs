//! Integration tests for confidence aggregation

use rxsentry_domain::{ConfidenceScore, Drug, SourceAuthority, VerdictOutcome};
use rxsentry_verify::{ConfidenceAggregator, MockVerdictProvider, VerifyConfig};
use std::sync::Arc;
use std::time::Duration;

fn warfarin() -> Drug {
    Drug::new("DRUG_001", "Warfarin").with_rxcui("11289")
}

fn aspirin() -> Drug {
    Drug::new("DRUG_002", "Aspirin").with_rxcui("1191")
}

fn rxnorm() -> MockVerdictProvider {
    MockVerdictProvider::new("rxnorm", SourceAuthority::High)
}

fn openfda() -> MockVerdictProvider {
    MockVerdictProvider::new("openfda", SourceAuthority::Low)
}

fn aggregator(providers: Vec<MockVerdictProvider>, config: &VerifyConfig) -> ConfidenceAggregator {
    let providers = providers
        .into_iter()
        .map(|p| Arc::new(p) as Arc<dyn rxsentry_verify::VerdictProvider>)
        .collect();
    ConfidenceAggregator::new(providers, config)
}

#[tokio::test]
async fn test_all_sources_confirm_scores_one() {
    let agg = aggregator(
        vec![
            rxnorm().with_default(VerdictOutcome::Matched { strength: 1.0 }),
            openfda().with_default(VerdictOutcome::Matched { strength: 12.0 }),
        ],
        &VerifyConfig::default(),
    );

    let result = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(result.score, ConfidenceScore::FULLY_CONFIRMED);
    assert_eq!(result.confirmed_by, vec!["rxnorm", "openfda"]);
    assert_eq!(result.answered_sources().count(), 2);
}

#[tokio::test]
async fn test_high_authority_only_scores_085() {
    let agg = aggregator(
        vec![
            rxnorm().with_default(VerdictOutcome::Matched { strength: 1.0 }),
            openfda(),
        ],
        &VerifyConfig::default(),
    );

    let result = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(result.score.value(), 0.85);
}

#[tokio::test]
async fn test_low_authority_strength_threshold_from_config() {
    let mut config = VerifyConfig::default();
    config.strength_threshold = 10.0;
    let agg = aggregator(
        vec![rxnorm(), openfda().with_default(VerdictOutcome::Matched { strength: 11.0 })],
        &config,
    );
    assert_eq!(agg.verify_pair(&warfarin(), &aspirin()).await.score.value(), 0.75);

    let agg = aggregator(
        vec![rxnorm(), openfda().with_default(VerdictOutcome::Matched { strength: 11.0 })],
        &VerifyConfig::default(),
    );
    assert_eq!(agg.verify_pair(&warfarin(), &aspirin()).await.score.value(), 0.55);
}

#[tokio::test]
async fn test_no_match_scores_03() {
    let agg = aggregator(vec![rxnorm(), openfda()], &VerifyConfig::default());
    let result = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(result.score, ConfidenceScore::UNCONFIRMED);
    assert!(result.confirmed_by.is_empty());
}

#[tokio::test]
async fn test_repeat_within_ttl_does_not_call_providers() {
    let rx = rxnorm().with_default(VerdictOutcome::Matched { strength: 1.0 });
    let fda = openfda();
    let agg = aggregator(vec![rx.clone(), fda.clone()], &VerifyConfig::default());

    let first = agg.verify_pair(&warfarin(), &aspirin()).await;
    // Reversed order hits the same unordered cache key
    let second = agg.verify_pair(&aspirin(), &warfarin()).await;

    assert_eq!(first.score, second.score);
    assert_eq!(first.verdicts, second.verdicts);
    assert_eq!(rx.call_count(), 1);
    assert_eq!(fda.call_count(), 1);

    let snapshot = agg.metrics().snapshot();
    assert_eq!(snapshot.provider_calls, 2);
    assert_eq!(snapshot.cache_hits, 2);
}

#[tokio::test]
async fn test_unavailable_source_is_retried_next_check() {
    let rx = rxnorm().with_default(VerdictOutcome::Matched { strength: 1.0 });
    rx.set_failing(true);
    let agg = aggregator(vec![rx.clone()], &VerifyConfig::default());

    let degraded = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(degraded.score.value(), 0.3);

    rx.set_failing(false);
    let recovered = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(recovered.score.value(), 1.0);
    assert_eq!(rx.call_count(), 2);
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let mut config = VerifyConfig::default();
    config.timeout_secs = 1;

    let slow = rxnorm()
        .with_default(VerdictOutcome::Matched { strength: 1.0 })
        .with_delay(Duration::from_secs(5));
    let fast = openfda().with_default(VerdictOutcome::Matched { strength: 500.0 });
    let agg = aggregator(vec![slow, fast], &config);

    let started = std::time::Instant::now();
    let result = agg.verify_pair(&warfarin(), &aspirin()).await;
    assert!(started.elapsed() < Duration::from_secs(3));

    assert_eq!(result.verdicts[0].outcome, VerdictOutcome::Unavailable);
    assert_eq!(result.score.value(), 0.75);
    assert_eq!(agg.metrics().snapshot().timeouts, 1);
}

#[tokio::test]
async fn test_clones_share_cache() {
    let rx = rxnorm();
    let agg = aggregator(vec![rx.clone()], &VerifyConfig::default());
    let clone = agg.clone();

    agg.verify_pair(&warfarin(), &aspirin()).await;
    clone.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(rx.call_count(), 1);

    agg.cache().clear();
    clone.verify_pair(&warfarin(), &aspirin()).await;
    assert_eq!(rx.call_count(), 2);
}

#[tokio::test]
async fn test_ids_sharing_a_joined_form_get_their_own_verdicts() {
    let rx = rxnorm().with_outcome("A|B", "C", VerdictOutcome::Matched { strength: 1.0 });
    let agg = aggregator(vec![rx.clone()], &VerifyConfig::default());

    let matched = agg
        .verify_pair(&Drug::new("A|B", "Left"), &Drug::new("C", "Right"))
        .await;
    assert_eq!(matched.score.value(), 1.0);

    let other = agg
        .verify_pair(&Drug::new("A", "Left"), &Drug::new("B|C", "Right"))
        .await;
    assert_eq!(other.score.value(), 0.3);
    assert_eq!(rx.call_count(), 2);
}
