//! Risk scoring strategies
//!
//! A [`RiskScorer`] turns the twelve named risk features into a 0-100
//! assessment. The rule-based scorer is always available; the statistical
//! scorer evaluates a logistic model loaded from JSON and is wrapped in a
//! [`FallbackScorer`] so a missing or broken model degrades to the rule-based
//! result instead of failing the check.

use crate::config::{EngineConfig, ScoringStrategy};
use crate::EngineError;
use rxsentry_domain::risk::FEATURE_NAMES;
use rxsentry_domain::{DetectedInteraction, PatientProfile, RiskAssessment, RiskFeatures};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Strategy that scores a feature set
pub trait RiskScorer: Send + Sync {
    /// Strategy name reported in the assessment
    fn name(&self) -> &str;

    /// Score the features
    fn score(&self, features: &RiskFeatures) -> Result<RiskAssessment, EngineError>;
}

/// Assemble the twelve features for a check
///
/// `checked` is the size of the drug list under review. Without a patient,
/// the patient-derived features are zero and the drug count is `checked`.
pub fn build_features(
    interactions: &[DetectedInteraction],
    patient: Option<&PatientProfile>,
    checked: usize,
) -> RiskFeatures {
    let mut features = match patient {
        Some(p) => RiskFeatures {
            patient_age: p.age,
            is_geriatric: p.is_geriatric(),
            has_renal_impairment: p.renal_impairment,
            has_hepatic_impairment: p.hepatic_impairment,
            num_chronic_conditions: p.chronic_conditions,
            num_allergies: p.allergy_count(),
            ..Default::default()
        }
        .with_drug_count(p.concurrent_drugs(checked)),
        None => RiskFeatures::default().with_drug_count(checked as u32),
    };
    for detected in interactions {
        features.add_interaction(detected.fact.severity);
    }
    features
}

/// Deterministic weighted formula
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    /// Strategy name
    pub const NAME: &'static str = "rule_based";

    /// Raw score before clamping, plus the factors that contributed
    fn evaluate(features: &RiskFeatures) -> (f64, Vec<String>) {
        let mut factors = Vec::new();

        let counts = [
            (features.contraindicated_count, 30.0, "contraindicated"),
            (features.serious_count, 15.0, "serious"),
            (features.significant_count, 7.0, "significant"),
            (features.minor_count, 2.0, "minor"),
        ];
        let mut score = 0.0;
        for (count, weight, label) in counts {
            if count > 0 {
                score += count as f64 * weight;
                factors.push(format!("{} {} interaction(s)", count, label));
            }
        }

        if features.is_geriatric {
            score *= 1.3;
            factors.push(format!("Geriatric patient (age {})", features.patient_age));
        }
        if features.has_renal_impairment {
            score *= 1.25;
            factors.push("Renal impairment".to_string());
        }
        if features.has_hepatic_impairment {
            score *= 1.25;
            factors.push("Hepatic impairment".to_string());
        }
        if features.polypharmacy {
            score *= 1.2;
            factors.push(format!("Polypharmacy ({} concurrent drugs)", features.num_drugs));
        }

        if features.num_allergies > 0 {
            score += features.num_allergies as f64 * 10.0;
            factors.push(format!("{} known allergies", features.num_allergies));
        }
        if features.num_chronic_conditions > 0 {
            score += features.num_chronic_conditions as f64 * 3.0;
            factors.push(format!("{} chronic conditions", features.num_chronic_conditions));
        }

        (score, factors)
    }
}

impl RiskScorer for RuleBasedScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, features: &RiskFeatures) -> Result<RiskAssessment, EngineError> {
        let (score, factors) = Self::evaluate(features);
        Ok(RiskAssessment::new(score, factors, Self::NAME))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    intercept: f64,
    weights: HashMap<String, f64>,
}

/// Logistic regression over the twelve risk features
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    intercept: f64,
    weights: [f64; 12],
}

impl LogisticModel {
    /// Create a model from an intercept and weights in feature order
    pub fn new(intercept: f64, weights: [f64; 12]) -> Self {
        Self { intercept, weights }
    }

    /// Parse `{"intercept": x, "weights": {"<feature>": w, ...}}`
    ///
    /// Every feature must have a weight; unknown feature names are rejected.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: ModelFile = serde_json::from_str(json)
            .map_err(|e| EngineError::StatisticalModelUnavailable(format!("invalid model file: {}", e)))?;

        if let Some(unknown) = file.weights.keys().find(|k| !FEATURE_NAMES.contains(&k.as_str())) {
            return Err(EngineError::StatisticalModelUnavailable(format!(
                "unknown feature in model: {}",
                unknown
            )));
        }

        let mut weights = [0.0; 12];
        for (slot, name) in weights.iter_mut().zip(FEATURE_NAMES.iter()) {
            *slot = *file.weights.get(*name).ok_or_else(|| {
                EngineError::StatisticalModelUnavailable(format!("model has no weight for {}", name))
            })?;
        }

        if !file.intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(EngineError::StatisticalModelUnavailable(
                "model parameters must be finite".to_string(),
            ));
        }

        Ok(Self::new(file.intercept, weights))
    }

    /// Load a model from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::StatisticalModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Probability of an adverse event, in [0, 1]
    pub fn probability(&self, features: &RiskFeatures) -> f64 {
        1.0 / (1.0 + (-self.logit(features)).exp())
    }

    fn logit(&self, features: &RiskFeatures) -> f64 {
        self.intercept
            + features
                .to_vector()
                .iter()
                .zip(self.weights.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }

    /// Features ranked by positive contribution to the logit
    fn top_contributions(&self, features: &RiskFeatures, limit: usize) -> Vec<String> {
        let mut contributions: Vec<(&str, f64)> = FEATURE_NAMES
            .iter()
            .zip(features.to_vector().iter().zip(self.weights.iter()))
            .map(|(name, (x, w))| (*name, x * w))
            .filter(|(_, c)| *c > 0.0)
            .collect();
        contributions.sort_by(|a, b| b.1.total_cmp(&a.1));
        contributions
            .into_iter()
            .take(limit)
            .map(|(name, c)| format!("{} (+{:.2})", name, c))
            .collect()
    }
}

/// Logistic model scorer
///
/// Holds the load error when the model could not be read, so scoring fails
/// with [`EngineError::StatisticalModelUnavailable`] rather than at startup.
#[derive(Debug, Clone)]
pub struct StatisticalScorer {
    model: Result<LogisticModel, EngineError>,
}

impl StatisticalScorer {
    /// Strategy name
    pub const NAME: &'static str = "statistical";

    /// Scorer over an already-loaded model
    pub fn new(model: LogisticModel) -> Self {
        Self { model: Ok(model) }
    }

    /// Load the model from `path`; a load failure is kept, not returned
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let model = LogisticModel::from_file(path.as_ref());
        match &model {
            Ok(_) => info!(path = %path.as_ref().display(), "Risk model loaded"),
            Err(e) => warn!(path = %path.as_ref().display(), error = %e, "Risk model unavailable"),
        }
        Self { model }
    }

    /// Whether a usable model is loaded
    pub fn is_loaded(&self) -> bool {
        self.model.is_ok()
    }
}

impl RiskScorer for StatisticalScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, features: &RiskFeatures) -> Result<RiskAssessment, EngineError> {
        let model = self.model.as_ref().map_err(Clone::clone)?;
        let probability = model.probability(features);
        if !probability.is_finite() {
            return Err(EngineError::StatisticalModelUnavailable(
                "model produced a non-finite probability".to_string(),
            ));
        }
        Ok(RiskAssessment::new(
            probability * 100.0,
            model.top_contributions(features, 3),
            Self::NAME,
        ))
    }
}

/// Runs a primary scorer and falls back to the rule-based formula on error
pub struct FallbackScorer {
    primary: Arc<dyn RiskScorer>,
    fallback: RuleBasedScorer,
}

impl FallbackScorer {
    /// Wrap `primary`
    pub fn new(primary: Arc<dyn RiskScorer>) -> Self {
        Self {
            primary,
            fallback: RuleBasedScorer,
        }
    }
}

impl RiskScorer for FallbackScorer {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn score(&self, features: &RiskFeatures) -> Result<RiskAssessment, EngineError> {
        match self.primary.score(features) {
            Ok(assessment) => Ok(assessment),
            Err(e) => {
                warn!(strategy = self.primary.name(), error = %e, "Risk scorer failed, using rule-based fallback");
                let mut assessment = self.fallback.score(features)?;
                assessment.fallback_used = true;
                Ok(assessment)
            }
        }
    }
}

/// Build the scorer selected by the configuration
pub fn scorer_from_config(config: &EngineConfig) -> Arc<dyn RiskScorer> {
    match (config.scoring, &config.model_path) {
        (ScoringStrategy::Statistical, Some(path)) => {
            Arc::new(FallbackScorer::new(Arc::new(StatisticalScorer::load(path))))
        }
        (ScoringStrategy::Statistical, None) => {
            warn!("Statistical scoring selected without model_path");
            Arc::new(FallbackScorer::new(Arc::new(StatisticalScorer {
                model: Err(EngineError::StatisticalModelUnavailable("no model_path configured".to_string())),
            })))
        }
        (ScoringStrategy::RuleBased, _) => Arc::new(RuleBasedScorer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rxsentry_domain::{RiskCategory, SeverityLevel, Sex};

    fn model_json(intercept: f64, weight: f64) -> String {
        let weights: Vec<String> = FEATURE_NAMES
            .iter()
            .map(|name| format!("\"{}\": {}", name, weight))
            .collect();
        format!("{{\"intercept\": {}, \"weights\": {{{}}}}}", intercept, weights.join(", "))
    }

    #[test]
    fn test_one_contraindicated_geriatric_is_moderate() {
        let mut features = RiskFeatures {
            patient_age: 70,
            is_geriatric: true,
            ..Default::default()
        }
        .with_drug_count(2);
        features.add_interaction(SeverityLevel::Contraindicated);

        let assessment = RuleBasedScorer.score(&features).unwrap();
        assert!((assessment.score - 39.0).abs() < 1e-9);
        assert_eq!(assessment.category, RiskCategory::Moderate);
        assert!(!assessment.fallback_used);
        assert_eq!(assessment.strategy, "rule_based");
    }

    #[test]
    fn test_multiplier_order_then_additive_terms() {
        let mut features = RiskFeatures {
            is_geriatric: true,
            has_renal_impairment: true,
            num_allergies: 1,
            num_chronic_conditions: 2,
            ..Default::default()
        };
        features.add_interaction(SeverityLevel::Significant);
        // 7 * 1.3 * 1.25 + 10 + 6
        let assessment = RuleBasedScorer.score(&features).unwrap();
        assert!((assessment.score - (7.0 * 1.3 * 1.25 + 16.0)).abs() < 1e-9);
        assert_eq!(assessment.contributing_factors.len(), 5);
    }

    #[test]
    fn test_build_features_without_patient() {
        let features = build_features(&[], None, 6);
        assert_eq!(features.num_drugs, 6);
        assert!(features.polypharmacy);
        assert_eq!(features.patient_age, 0);
    }

    #[test]
    fn test_build_features_uses_larger_drug_count() {
        let mut patient = PatientProfile::new("P1", 80, 60.0, Sex::Female);
        patient.current_drug_count = 8;
        let features = build_features(&[], Some(&patient), 3);
        assert_eq!(features.num_drugs, 8);
        assert!(features.is_geriatric);
    }

    #[test]
    fn test_logistic_model_parses_and_scores() {
        let model = LogisticModel::from_json(&model_json(0.0, 0.0)).unwrap();
        let assessment = StatisticalScorer::new(model).score(&RiskFeatures::default()).unwrap();
        assert!((assessment.score - 50.0).abs() < 1e-9);
        assert_eq!(assessment.strategy, "statistical");
    }

    #[test]
    fn test_logistic_model_rejects_incomplete_weights() {
        let json = r#"{"intercept": 0.1, "weights": {"serious_count": 1.0}}"#;
        assert!(matches!(
            LogisticModel::from_json(json),
            Err(EngineError::StatisticalModelUnavailable(_))
        ));

        let with_unknown = model_json(0.0, 1.0).replacen("\"num_drugs\"", "\"heart_rate\"", 1);
        assert!(LogisticModel::from_json(&with_unknown).is_err());
    }

    #[test]
    fn test_missing_model_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = FallbackScorer::new(Arc::new(StatisticalScorer::load(dir.path().join("absent.json"))));

        let mut features = RiskFeatures::default();
        features.add_interaction(SeverityLevel::Serious);
        let assessment = scorer.score(&features).unwrap();
        assert!(assessment.fallback_used);
        assert_eq!(assessment.score, 15.0);
        assert_eq!(assessment.strategy, "rule_based");
    }

    #[test]
    fn test_model_file_is_used_when_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, model_json(-2.0, 0.5)).unwrap();

        let mut config = EngineConfig::default();
        config.scoring = ScoringStrategy::Statistical;
        config.model_path = Some(path);
        let scorer = scorer_from_config(&config);

        let assessment = scorer.score(&RiskFeatures::default()).unwrap();
        assert!(!assessment.fallback_used);
        assert_eq!(assessment.strategy, "statistical");
    }

    proptest! {
        #[test]
        fn prop_rule_score_is_clamped(
            c in 0u32..50, s in 0u32..50, g in 0u32..50, m in 0u32..50,
            age in 0u32..120, renal in any::<bool>(), hepatic in any::<bool>(),
            chronic in 0u32..40, allergies in 0u32..40, drugs in 0u32..40,
        ) {
            let features = RiskFeatures {
                contraindicated_count: c,
                serious_count: s,
                significant_count: g,
                minor_count: m,
                patient_age: age,
                is_geriatric: age >= 65,
                has_renal_impairment: renal,
                has_hepatic_impairment: hepatic,
                num_chronic_conditions: chronic,
                num_allergies: allergies,
                ..Default::default()
            }
            .with_drug_count(drugs);
            let assessment = RuleBasedScorer.score(&features).unwrap();
            prop_assert!((0.0..=100.0).contains(&assessment.score));
            prop_assert_eq!(assessment.category, RiskCategory::from_score(assessment.score));
        }

        #[test]
        fn prop_statistical_score_is_bounded(intercept in -50.0f64..50.0, weight in -5.0f64..5.0, n in 0u32..30) {
            let model = LogisticModel::from_json(&model_json(intercept, weight)).unwrap();
            let mut features = RiskFeatures::default().with_drug_count(n);
            features.serious_count = n;
            let assessment = StatisticalScorer::new(model).score(&features).unwrap();
            prop_assert!((0.0..=100.0).contains(&assessment.score));
        }
    }
}
