//! Request and result types for the pipeline

use rxsentry_domain::{
    AlertSet, AllergyAlert, CheckId, DetectedInteraction, Drug, EscalationDecision, RiskAssessment,
    SeverityLevel,
};
use rxsentry_llm::Narrative;
use std::collections::BTreeMap;

/// Cap of the weighted interaction risk sum
pub const INTERACTION_RISK_CAP: f64 = 100.0;

/// Input to one pipeline execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckRequest {
    /// Drug identifiers to check (1-20, unique)
    pub drug_ids: Vec<String>,

    /// Patient whose profile adjusts risk and alert priority
    pub patient_id: Option<String>,

    /// Cross-check the patient's allergy records
    pub include_allergy_check: bool,

    /// Ask the narrative provider for an analysis
    pub include_narrative: bool,
}

impl CheckRequest {
    /// Request for a drug list with no patient and no optional stages
    pub fn new<S: Into<String>>(drug_ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            drug_ids: drug_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Attach a patient
    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Enable the allergy cross-check
    pub fn with_allergy_check(mut self) -> Self {
        self.include_allergy_check = true;
        self
    }

    /// Enable the narrative stage
    pub fn with_narrative(mut self) -> Self {
        self.include_narrative = true;
        self
    }
}

/// Assembled result of one check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// Time-ordered identifier of this execution
    pub check_id: CheckId,

    /// Epoch milliseconds the check started
    pub checked_at: u64,

    /// Patient the check was run for
    pub patient_id: Option<String>,

    /// Checked drugs, in request order
    pub drugs: Vec<Drug>,

    /// Every detected interaction, most dangerous first
    pub interactions: Vec<DetectedInteraction>,

    /// Interactions selected for display
    pub alerts: AlertSet,

    /// Detected interaction count per severity (all four keys)
    pub severity_summary: BTreeMap<SeverityLevel, usize>,

    /// Weighted severity sum, capped at 100
    pub interaction_risk_score: f64,

    /// Patient-aware risk assessment
    pub risk: RiskAssessment,

    /// Narrative, when requested and produced in time
    pub narrative: Option<Narrative>,

    /// Escalation decision
    pub escalation: EscalationDecision,

    /// Deterministic recommendations followed by narrative ones, deduplicated
    pub recommendations: Vec<String>,

    /// Allergy conflicts, when requested for a known patient
    pub allergy_alerts: Vec<AllergyAlert>,

    /// Verification sources that answered for at least one pair
    pub external_sources_checked: Vec<String>,

    /// Degradations that did not fail the check
    pub warnings: Vec<String>,
}

/// Count detected interactions per severity, with every key present
pub fn severity_summary(interactions: &[DetectedInteraction]) -> BTreeMap<SeverityLevel, usize> {
    let mut summary: BTreeMap<SeverityLevel, usize> = SeverityLevel::ALL.iter().map(|s| (*s, 0)).collect();
    for detected in interactions {
        *summary.entry(detected.fact.severity).or_insert(0) += 1;
    }
    summary
}

/// Sum of severity weights (10 / 5 / 2 / 0.5), capped at 100
pub fn interaction_risk_score(interactions: &[DetectedInteraction]) -> f64 {
    interactions
        .iter()
        .map(|d| d.fact.severity.weight())
        .sum::<f64>()
        .min(INTERACTION_RISK_CAP)
}

/// Reachability of one collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentHealth {
    /// Reachable
    Healthy,
    /// Configured but not reachable
    Unavailable(String),
    /// Not configured
    Disabled,
}

impl ComponentHealth {
    /// Short status string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentHealth::Healthy => "healthy",
            ComponentHealth::Unavailable(_) => "unavailable",
            ComponentHealth::Disabled => "disabled",
        }
    }

    /// Failure detail, when unavailable
    pub fn detail(&self) -> Option<&str> {
        match self {
            ComponentHealth::Unavailable(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Independent health of each collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    /// Drug catalog
    pub catalog: ComponentHealth,
    /// Narrative provider
    pub narrative: ComponentHealth,
    /// Configured verification sources
    pub verification_sources: Vec<String>,
    /// Risk scoring strategy in use
    pub scoring_strategy: String,
}

impl HealthReport {
    /// Healthy when the catalog is reachable; the narrative is optional
    pub fn is_healthy(&self) -> bool {
        self.catalog == ComponentHealth::Healthy
    }
}
