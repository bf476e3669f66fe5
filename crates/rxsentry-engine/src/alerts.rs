//! Smart alert filtering
//!
//! Ranks interactions by a patient- and drug-adjusted priority and truncates
//! the low-severity buckets to reduce alert fatigue. CONTRAINDICATED and
//! SERIOUS facts are always shown, whatever the configured limits.

use crate::config::AlertConfig;
use rxsentry_domain::{AlertSet, Drug, InteractionFact, PatientProfile, ScoredInteraction, SeverityLevel};

/// Concurrent drug count at which alert priority is raised
pub const ALERT_POLYPHARMACY_THRESHOLD: u32 = 10;

/// Priority ranking and per-severity truncation
#[derive(Debug, Clone)]
pub struct SmartAlertFilter {
    config: AlertConfig,
}

impl SmartAlertFilter {
    /// Create a filter with the given limits and high-risk classes
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Limits in effect
    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Patient-level multiplier; 1.0 when no patient is known
    pub fn patient_multiplier(patient: Option<&PatientProfile>, checked: usize) -> f64 {
        let Some(patient) = patient else {
            return 1.0;
        };

        let mut multiplier = 1.0;
        if patient.is_geriatric() {
            multiplier *= 1.3;
        }
        if patient.is_advanced_age() {
            multiplier *= 1.2;
        }
        if patient.renal_impairment {
            multiplier *= 1.25;
        }
        if patient.hepatic_impairment {
            multiplier *= 1.25;
        }
        if patient.concurrent_drugs(checked) >= ALERT_POLYPHARMACY_THRESHOLD {
            multiplier *= 1.3;
        }
        multiplier
    }

    /// Drug-level multiplier for one fact
    ///
    /// `drugs` are the resolved drugs of the check; either side of the pair
    /// belonging to a high-risk class counts once.
    pub fn drug_multiplier(&self, fact: &InteractionFact, drugs: &[Drug]) -> f64 {
        let mut multiplier = 1.0;
        let high_risk = drugs
            .iter()
            .filter(|d| fact.pair.contains(&d.id))
            .any(|d| d.in_any_class(&self.config.high_risk_classes));
        if high_risk {
            multiplier *= 1.5;
        }
        if fact.documented_adverse_outcomes {
            multiplier *= 1.3;
        }
        multiplier
    }

    /// `basePriority × patientMultiplier × drugMultiplier`
    pub fn priority(&self, fact: &InteractionFact, drugs: &[Drug], patient_multiplier: f64) -> f64 {
        fact.severity.base_priority() * patient_multiplier * self.drug_multiplier(fact, drugs)
    }

    fn limit(&self, severity: SeverityLevel) -> Option<usize> {
        match severity {
            SeverityLevel::Contraindicated | SeverityLevel::Serious => None,
            SeverityLevel::Significant => Some(self.config.significant_limit),
            SeverityLevel::Minor => Some(self.config.minor_limit),
        }
    }

    /// Select the alerts to display
    ///
    /// Each bucket is ordered by descending priority, ties by detection
    /// order, then truncated to its limit. Buckets are concatenated most
    /// dangerous first.
    pub fn filter(&self, candidates: Vec<ScoredInteraction>) -> AlertSet {
        let mut set = AlertSet::empty();

        for severity in SeverityLevel::ALL {
            let mut bucket: Vec<ScoredInteraction> = candidates
                .iter()
                .filter(|c| c.severity() == severity)
                .cloned()
                .collect();
            bucket.sort_by(|a, b| {
                b.priority
                    .total_cmp(&a.priority)
                    .then(a.detection_index.cmp(&b.detection_index))
            });

            let total = bucket.len();
            if let Some(limit) = self.limit(severity) {
                bucket.truncate(limit);
            }

            set.shown.insert(severity, bucket.len());
            set.filtered.insert(severity, total - bucket.len());
            set.alerts.extend(bucket);
        }

        if set.total_filtered() > 0 {
            set.filtering_reason = Some(format!(
                "Showing top {} SIGNIFICANT and top {} MINOR alerts by priority; {} lower-priority alert(s) filtered. All CONTRAINDICATED and SERIOUS alerts are shown.",
                self.config.significant_limit,
                self.config.minor_limit,
                set.total_filtered()
            ));
        }

        set
    }
}

impl Default for SmartAlertFilter {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
