//! Pipeline orchestrator
//!
//! One [`Pipeline::check`] call runs validate → detect → (verify ∥ narrate)
//! → risk → filter → escalate → allergy check → assemble. Verification and
//! the narrative run concurrently; both are best-effort and only ever add
//! warnings to the report.

use crate::alerts::SmartAlertFilter;
use crate::allergy::check_allergies;
use crate::config::EngineConfig;
use crate::detector::{detect, validate_drug_ids, Detection};
use crate::dose::{DoseCalculator, DoseTables, HepaticDoseRequest, RenalDoseRequest};
use crate::escalation::decide;
use crate::error::EngineError;
use crate::report::{
    interaction_risk_score, severity_summary, CheckReport, CheckRequest, ComponentHealth, HealthReport,
};
use crate::scorer::{build_features, scorer_from_config, FallbackScorer, RiskScorer};
use rxsentry_domain::risk::POLYPHARMACY_THRESHOLD;
use rxsentry_domain::traits::DrugCatalog;
use rxsentry_domain::{
    AlertSet, AllergyAlert, CheckId, Drug, DrugId, DoseAdjustmentResult, InteractionFact, PatientProfile,
    ScoredInteraction, SeverityLevel, VerdictOutcome,
};
use rxsentry_llm::{Narrative, NarrativeProvider, NarrativeRequest};
use rxsentry_verify::{ConfidenceAggregator, PairConfidence};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The interaction risk and alert pipeline
///
/// Holds every collaborator for the lifetime of the service; each
/// [`check`](Pipeline::check) is independent and shares only the verdict
/// cache.
pub struct Pipeline<C: ?Sized> {
    catalog: Arc<C>,
    aggregator: ConfidenceAggregator,
    scorer: Arc<dyn RiskScorer>,
    filter: SmartAlertFilter,
    narrative: Option<Arc<dyn NarrativeProvider>>,
    dose: DoseCalculator,
    config: EngineConfig,
}

impl<C> Pipeline<C>
where
    C: DrugCatalog + Send + Sync + ?Sized,
    C::Error: Display,
{
    /// Create a pipeline with no verification sources and no narrative
    ///
    /// The scorer and dose tables are taken from `config`.
    pub fn new(catalog: Arc<C>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;

        let tables = match &config.dose_table_path {
            Some(path) => DoseTables::from_file(path)?,
            None => DoseTables::builtin()?,
        };

        Ok(Self {
            catalog,
            aggregator: ConfidenceAggregator::without_sources(),
            scorer: scorer_from_config(&config),
            filter: SmartAlertFilter::new(config.alerts.clone()),
            narrative: None,
            dose: DoseCalculator::new(tables),
            config,
        })
    }

    /// Use the given verification aggregator
    pub fn with_aggregator(mut self, aggregator: ConfidenceAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Replace the risk scorer
    ///
    /// A scorer that fails at check time degrades to the rule-based score
    /// and the report carries the fallback flag.
    pub fn with_scorer(mut self, scorer: Arc<dyn RiskScorer>) -> Self {
        self.scorer = Arc::new(FallbackScorer::new(scorer));
        self
    }

    /// Attach a narrative provider
    pub fn with_narrative(mut self, provider: Arc<dyn NarrativeProvider>) -> Self {
        self.narrative = Some(provider);
        self
    }

    /// Replace the dose calculator
    pub fn with_dose_calculator(mut self, dose: DoseCalculator) -> Self {
        self.dose = dose;
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Verification aggregator (shared cache and metrics)
    pub fn aggregator(&self) -> &ConfidenceAggregator {
        &self.aggregator
    }

    /// Run one interaction check
    pub async fn check(&self, request: CheckRequest) -> Result<CheckReport, EngineError> {
        let check_id = CheckId::new();
        let ids = validate_drug_ids(&request.drug_ids, self.config.max_drugs)?;
        let patient = self.resolve_patient(request.patient_id.as_deref())?;

        let detection = detect(self.catalog.as_ref(), &ids)?;
        debug!(
            check_id = %check_id,
            drugs = ids.len(),
            interactions = detection.interactions.len(),
            "Detection complete"
        );

        let pairs = pair_drugs(&detection)?;
        let (confidences, narrative) = tokio::join!(
            self.aggregator.verify_all(pairs),
            self.narrate(&request, &detection, patient.as_ref())
        );

        let mut warnings = source_warnings(&self.aggregator.source_ids(), &confidences);
        let narrative = match narrative {
            Some(Ok(narrative)) => Some(narrative),
            Some(Err(e)) => {
                warnings.push(e.to_string());
                None
            }
            None => None,
        };

        let patient_multiplier = SmartAlertFilter::patient_multiplier(patient.as_ref(), ids.len());
        let scored: Vec<ScoredInteraction> = detection
            .interactions
            .iter()
            .zip(&confidences)
            .map(|(detected, confidence)| ScoredInteraction {
                priority: self.filter.priority(&detected.fact, &detection.drugs, patient_multiplier),
                fact: detected.fact.clone(),
                confidence: confidence.score,
                confirmed_by: confidence.confirmed_by.clone(),
                detection_index: detected.detection_index,
            })
            .collect();

        let features = build_features(&detection.interactions, patient.as_ref(), ids.len());
        let risk = self.scorer.score(&features)?;
        if risk.fallback_used {
            warnings.push(
                EngineError::StatisticalModelUnavailable("rule-based score used".to_string()).to_string(),
            );
        }

        let alerts = self.filter.filter(scored);
        let escalation = decide(&alerts, &risk);

        let allergy_alerts = match (&patient, request.include_allergy_check) {
            (Some(patient), true) => check_allergies(patient, &detection.drugs),
            (None, true) => {
                warnings.push("Allergy check requested without a patient; skipped".to_string());
                Vec::new()
            }
            _ => Vec::new(),
        };

        let recommendations = build_recommendations(
            &detection.drugs,
            &alerts,
            patient.as_ref(),
            &allergy_alerts,
            narrative.as_ref(),
        );

        let report = CheckReport {
            check_id,
            checked_at: check_id.timestamp(),
            patient_id: patient.as_ref().map(|p| p.id.clone()),
            severity_summary: severity_summary(&detection.interactions),
            interaction_risk_score: interaction_risk_score(&detection.interactions),
            external_sources_checked: answered_sources(&self.aggregator.source_ids(), &confidences),
            drugs: detection.drugs,
            interactions: detection.interactions,
            alerts,
            risk,
            narrative,
            escalation,
            recommendations,
            allergy_alerts,
            warnings,
        };

        info!(
            check_id = %report.check_id,
            drugs = report.drugs.len(),
            interactions = report.interactions.len(),
            shown = report.alerts.total_shown(),
            filtered = report.alerts.total_filtered(),
            risk_score = report.risk.score,
            escalate = report.escalation.required,
            "Check complete"
        );

        Ok(report)
    }

    fn resolve_patient(&self, patient_id: Option<&str>) -> Result<Option<PatientProfile>, EngineError> {
        let Some(id) = patient_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        match self
            .catalog
            .get_patient(id)
            .map_err(|e| EngineError::Catalog(e.to_string()))?
        {
            Some(patient) => Ok(Some(patient)),
            None => Err(EngineError::InvalidInput(format!("unknown patient id: {}", id))),
        }
    }

    /// `None` when not requested; otherwise the narrative or why it is absent
    async fn narrate(
        &self,
        request: &CheckRequest,
        detection: &Detection,
        patient: Option<&PatientProfile>,
    ) -> Option<Result<Narrative, EngineError>> {
        if !request.include_narrative {
            return None;
        }
        let Some(provider) = &self.narrative else {
            return Some(Err(EngineError::ExternalSourceUnavailable(
                "narrative provider not configured".to_string(),
            )));
        };

        let facts: Vec<InteractionFact> = detection.interactions.iter().map(|d| d.fact.clone()).collect();
        let narrative_request = NarrativeRequest::from_check(&detection.drugs, &facts, patient);
        let budget = self.config.narrative_timeout();

        let result = match timeout(budget, provider.narrate(&narrative_request)).await {
            Ok(Ok(narrative)) => Ok(narrative),
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "Narrative generation failed");
                Err(EngineError::ExternalSourceUnavailable(format!("narrative: {}", e)))
            }
            Err(_) => {
                warn!(provider = provider.name(), timeout_ms = budget.as_millis() as u64, "Narrative timed out");
                Err(EngineError::ExternalSourceUnavailable(format!(
                    "narrative timed out after {:?}",
                    budget
                )))
            }
        };
        Some(result)
    }

    /// Renal dose adjustment
    pub fn dose_adjustment(&self, request: &RenalDoseRequest) -> Result<DoseAdjustmentResult, EngineError> {
        let result = self.dose.renal(request)?;
        info!(
            drug_id = %result.drug_id,
            category = %result.category.label(),
            factor = result.adjustment_factor,
            contraindicated = result.contraindicated,
            "Renal dose adjustment"
        );
        Ok(result)
    }

    /// Hepatic dose adjustment
    pub fn hepatic_adjustment(&self, request: &HepaticDoseRequest) -> Result<DoseAdjustmentResult, EngineError> {
        let result = self.dose.hepatic(request)?;
        info!(
            drug_id = %result.drug_id,
            category = %result.category.label(),
            factor = result.adjustment_factor,
            contraindicated = result.contraindicated,
            "Hepatic dose adjustment"
        );
        Ok(result)
    }

    /// Every drug in the catalog
    pub fn list_drugs(&self) -> Result<Vec<Drug>, EngineError> {
        self.catalog.list_drugs().map_err(|e| EngineError::Catalog(e.to_string()))
    }

    /// Reachability of the catalog and the narrative provider, checked independently
    pub async fn health(&self) -> HealthReport {
        let catalog = match self.catalog.ping() {
            Ok(()) => ComponentHealth::Healthy,
            Err(e) => ComponentHealth::Unavailable(e.to_string()),
        };

        let narrative = match &self.narrative {
            None => ComponentHealth::Disabled,
            Some(provider) => match timeout(self.config.narrative_timeout(), provider.health()).await {
                Ok(Ok(())) => ComponentHealth::Healthy,
                Ok(Err(e)) => ComponentHealth::Unavailable(e.to_string()),
                Err(_) => ComponentHealth::Unavailable("health check timed out".to_string()),
            },
        };

        HealthReport {
            catalog,
            narrative,
            verification_sources: self.aggregator.source_ids(),
            scoring_strategy: self.scorer.name().to_string(),
        }
    }
}

/// The drug records of every detected pair, in detection output order
fn pair_drugs(detection: &Detection) -> Result<Vec<(Drug, Drug)>, EngineError> {
    let by_id: HashMap<&DrugId, &Drug> = detection.drugs.iter().map(|d| (&d.id, d)).collect();
    let resolve = |id: &DrugId| {
        by_id
            .get(id)
            .map(|drug| (*drug).clone())
            .ok_or_else(|| EngineError::Catalog(format!("interaction references unresolved drug {}", id)))
    };
    detection
        .interactions
        .iter()
        .map(|detected| -> Result<(Drug, Drug), EngineError> {
            Ok((resolve(detected.pair.first())?, resolve(detected.pair.second())?))
        })
        .collect()
}

/// Sources that answered for at least one pair, in provider order
fn answered_sources(source_ids: &[String], confidences: &[PairConfidence]) -> Vec<String> {
    let answered: HashSet<&str> = confidences.iter().flat_map(|c| c.answered_sources()).collect();
    source_ids
        .iter()
        .filter(|id| answered.contains(id.as_str()))
        .cloned()
        .collect()
}

/// One warning per source that failed for any pair
fn source_warnings(source_ids: &[String], confidences: &[PairConfidence]) -> Vec<String> {
    source_ids
        .iter()
        .filter_map(|source| {
            let missed = confidences
                .iter()
                .flat_map(|c| c.verdicts.iter())
                .filter(|v| &v.source == source && v.outcome == VerdictOutcome::Unavailable)
                .count();
            (missed > 0).then(|| {
                EngineError::ExternalSourceUnavailable(format!("{} did not answer for {} pair(s)", source, missed))
                    .to_string()
            })
        })
        .collect()
}

fn drug_name(drugs: &[Drug], id: &DrugId) -> String {
    drugs
        .iter()
        .find(|d| &d.id == id)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Deterministic advice first, then narrative advice; duplicates dropped
fn build_recommendations(
    drugs: &[Drug],
    alerts: &AlertSet,
    patient: Option<&PatientProfile>,
    allergy_alerts: &[AllergyAlert],
    narrative: Option<&Narrative>,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    for alert in alerts.alerts.iter().filter(|a| a.severity().requires_full_recall()) {
        let a = drug_name(drugs, alert.fact.pair.first());
        let b = drug_name(drugs, alert.fact.pair.second());
        let guidance = if alert.fact.management.is_empty() {
            &alert.fact.description
        } else {
            &alert.fact.management
        };
        let prefix = match alert.severity() {
            SeverityLevel::Contraindicated => format!("Avoid {} with {}", a, b),
            _ => format!("{} with {}", a, b),
        };
        if guidance.is_empty() {
            recommendations.push(format!("{}.", prefix));
        } else {
            recommendations.push(format!("{}: {}", prefix, guidance));
        }
    }

    if alerts.contains_severity(SeverityLevel::Significant) {
        recommendations.push("Monitor the patient for effects of the significant interactions listed.".to_string());
    }
    if alerts.total() == 0 {
        recommendations.push("No interactions found among the checked drugs. Continue routine monitoring.".to_string());
    }

    if let Some(patient) = patient {
        if patient.is_geriatric() && alerts.total() > 0 {
            recommendations
                .push("Older adult: start low, titrate slowly and review against the Beers criteria.".to_string());
        }
        if patient.renal_impairment {
            recommendations.push("Renal impairment: check renally cleared drugs with the renal dose calculator.".to_string());
        }
        if patient.hepatic_impairment {
            recommendations
                .push("Hepatic impairment: check hepatically metabolised drugs with the hepatic dose calculator.".to_string());
        }
        if patient.concurrent_drugs(drugs.len()) >= POLYPHARMACY_THRESHOLD {
            recommendations.push("Polypharmacy: perform a medication reconciliation and deprescribing review.".to_string());
        }
    }

    if !allergy_alerts.is_empty() {
        recommendations.push(format!(
            "Resolve {} allergy conflict(s) before dispensing.",
            allergy_alerts.len()
        ));
    }

    if let Some(narrative) = narrative {
        recommendations.extend(narrative.recommendations.iter().cloned());
    }

    let mut seen = HashSet::new();
    recommendations.retain(|r| seen.insert(r.trim().to_lowercase()));
    recommendations
}
