//! Property tests for detection, alert filtering, escalation and caching

use proptest::prelude::*;
use rxsentry_domain::{
    Drug, DrugId, DrugPair, InteractionFact, RiskCategory, SeverityLevel, SourceAuthority, VerdictOutcome,
};
use rxsentry_engine::{detect, CheckRequest, EngineConfig, Pipeline};
use rxsentry_store::InMemoryCatalog;
use rxsentry_verify::{ConfidenceAggregator, MockVerdictProvider, VerdictProvider, VerifyConfig};
use std::sync::Arc;

fn severity() -> impl Strategy<Value = SeverityLevel> {
    prop_oneof![
        Just(SeverityLevel::Contraindicated),
        Just(SeverityLevel::Serious),
        Just(SeverityLevel::Significant),
        Just(SeverityLevel::Minor),
    ]
}

fn drug_id(i: usize) -> String {
    format!("D{:02}", i)
}

/// A catalog over `n` drugs with one optional fact per pair, stored in the
/// direction given by `reversed`
fn catalog(n: usize, facts: &[(Option<SeverityLevel>, bool)]) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    for i in 0..n {
        let mut drug = Drug::new(drug_id(i), format!("Drug {}", i));
        if i % 4 == 0 {
            drug = drug.with_class("anticoagulant");
        }
        catalog.add_drug(drug).unwrap();
    }

    let mut k = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some((Some(severity), reversed)) = facts.get(k) {
                let fact = InteractionFact::new(format!("I{}_{}", i, j), drug_id(i), drug_id(j), *severity);
                let fact = if (i + j) % 3 == 0 { fact.with_documented_adverse_outcomes() } else { fact };
                if *reversed {
                    catalog.add_interaction_directed(DrugId::new(drug_id(j)), DrugId::new(drug_id(i)), fact);
                } else {
                    catalog.add_interaction_directed(DrugId::new(drug_id(i)), DrugId::new(drug_id(j)), fact);
                }
            }
            k += 1;
        }
    }
    catalog
}

fn catalog_strategy(max: usize) -> impl Strategy<Value = (usize, Vec<(Option<SeverityLevel>, bool)>)> {
    (2..=max).prop_flat_map(|n| {
        let pairs = n * (n - 1) / 2;
        (
            Just(n),
            proptest::collection::vec((proptest::option::of(severity()), any::<bool>()), pairs),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_detection_is_order_independent(
        (n, facts) in catalog_strategy(12),
        seed in any::<u64>(),
    ) {
        let catalog = catalog(n, &facts);
        let ids: Vec<DrugId> = (0..n).map(|i| DrugId::new(drug_id(i))).collect();

        // Deterministic shuffle from the seed
        let mut shuffled = ids.clone();
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            shuffled.swap(i, (state >> 33) as usize % (i + 1));
        }

        let a = detect(&catalog, &ids).unwrap();
        let b = detect(&catalog, &shuffled).unwrap();

        let mut left: Vec<(DrugPair, String)> = a.interactions.iter().map(|d| (d.fact.pair.clone(), d.fact.id.clone())).collect();
        let mut right: Vec<(DrugPair, String)> = b.interactions.iter().map(|d| (d.fact.pair.clone(), d.fact.id.clone())).collect();
        left.sort();
        right.sort();
        prop_assert_eq!(left, right);

        for window in b.interactions.windows(2) {
            prop_assert!(window[0].fact.severity <= window[1].fact.severity);
        }
    }

    #[test]
    fn prop_full_recall_and_escalation((n, facts) in catalog_strategy(20)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let pipeline = Pipeline::new(Arc::new(catalog(n, &facts)), EngineConfig::default()).unwrap();
        let request = CheckRequest::new((0..n).map(drug_id));
        let report = runtime.block_on(pipeline.check(request)).unwrap();

        let detected = |s: SeverityLevel| report.interactions.iter().filter(|d| d.fact.severity == s).count();
        let shown = |s: SeverityLevel| report.alerts.alerts.iter().filter(|a| a.severity() == s).count();

        prop_assert_eq!(shown(SeverityLevel::Contraindicated), detected(SeverityLevel::Contraindicated));
        prop_assert_eq!(shown(SeverityLevel::Serious), detected(SeverityLevel::Serious));
        prop_assert!(shown(SeverityLevel::Significant) <= 5);
        prop_assert!(shown(SeverityLevel::Minor) <= 3);
        prop_assert_eq!(report.alerts.total(), report.interactions.len());

        for window in report.alerts.alerts.windows(2) {
            prop_assert!(window[0].severity() <= window[1].severity());
        }

        let has_contraindicated = detected(SeverityLevel::Contraindicated) > 0;
        if has_contraindicated {
            prop_assert!(report.escalation.required);
        }
        prop_assert_eq!(
            report.escalation.required,
            has_contraindicated || report.risk.category == RiskCategory::Critical
        );

        prop_assert!((0.0..=100.0).contains(&report.risk.score));
        prop_assert!(report.interaction_risk_score <= 100.0);
        prop_assert_eq!(report.severity_summary.len(), 4);
    }
}

#[tokio::test]
async fn test_repeat_check_within_ttl_reuses_verdicts() {
    let facts = vec![
        (Some(SeverityLevel::Serious), false),
        (Some(SeverityLevel::Minor), true),
        (None, false),
    ];
    let rx = MockVerdictProvider::new("rxnorm", SourceAuthority::High)
        .with_default(VerdictOutcome::Matched { strength: 1.0 });
    let fda = MockVerdictProvider::new("openfda", SourceAuthority::Low)
        .with_default(VerdictOutcome::Matched { strength: 250.0 });

    let providers: Vec<Arc<dyn VerdictProvider>> = vec![Arc::new(rx.clone()), Arc::new(fda.clone())];
    let pipeline = Pipeline::new(Arc::new(catalog(3, &facts)), EngineConfig::default())
        .unwrap()
        .with_aggregator(ConfidenceAggregator::new(providers, &VerifyConfig::default()));

    let request = CheckRequest::new(["D00", "D01", "D02"]);
    let first = pipeline.check(request.clone()).await.unwrap();
    assert_eq!(rx.call_count(), 2);
    assert_eq!(fda.call_count(), 2);

    // Same drugs in another order hit the same unordered cache keys
    let second = pipeline.check(CheckRequest::new(["D02", "D00", "D01"])).await.unwrap();
    assert_eq!(rx.call_count(), 2);
    assert_eq!(fda.call_count(), 2);

    let scores = |r: &rxsentry_engine::CheckReport| -> Vec<(String, f64)> {
        let mut s: Vec<(String, f64)> = r
            .alerts
            .alerts
            .iter()
            .map(|a| (a.fact.id.clone(), a.confidence.value()))
            .collect();
        s.sort_by(|a, b| a.0.cmp(&b.0));
        s
    };
    assert_eq!(scores(&first), scores(&second));
    assert!(scores(&first).iter().all(|(_, c)| *c == 1.0));
    assert_eq!(first.external_sources_checked, vec!["rxnorm", "openfda"]);
    assert_eq!(pipeline.aggregator().metrics().snapshot().cache_hits, 4);
}
