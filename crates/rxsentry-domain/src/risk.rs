//! Risk assessment value objects shared by every scoring strategy

use crate::SeverityLevel;

/// Risk category derived from a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskCategory {
    /// [0, 25)
    Low,
    /// [25, 50)
    Moderate,
    /// [50, 75)
    High,
    /// [75, 100]
    Critical,
}

impl RiskCategory {
    /// Classify a score using the fixed thresholds
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskCategory::Critical
        } else if score >= 50.0 {
            RiskCategory::High
        } else if score >= 25.0 {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }

    /// Get the category as a lower-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::High => "high",
            RiskCategory::Critical => "critical",
        }
    }
}

/// Names of the features every scoring strategy consumes, in vector order
pub const FEATURE_NAMES: [&str; 12] = [
    "contraindicated_count",
    "serious_count",
    "significant_count",
    "minor_count",
    "patient_age",
    "is_geriatric",
    "has_renal_impairment",
    "has_hepatic_impairment",
    "num_chronic_conditions",
    "polypharmacy",
    "num_allergies",
    "num_drugs",
];

/// Concurrent drug count at which polypharmacy applies to risk scoring
pub const POLYPHARMACY_THRESHOLD: u32 = 5;

/// Input features for risk scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskFeatures {
    /// Number of contraindicated interactions
    pub contraindicated_count: u32,
    /// Number of serious interactions
    pub serious_count: u32,
    /// Number of significant interactions
    pub significant_count: u32,
    /// Number of minor interactions
    pub minor_count: u32,
    /// Patient age in years (0 when unknown)
    pub patient_age: u32,
    /// Age >= 65
    pub is_geriatric: bool,
    /// Known renal impairment
    pub has_renal_impairment: bool,
    /// Known hepatic impairment
    pub has_hepatic_impairment: bool,
    /// Number of chronic conditions
    pub num_chronic_conditions: u32,
    /// Five or more concurrent drugs
    pub polypharmacy: bool,
    /// Number of known allergies
    pub num_allergies: u32,
    /// Concurrent drug count
    pub num_drugs: u32,
}

impl RiskFeatures {
    /// Count an interaction of the given severity
    pub fn add_interaction(&mut self, severity: SeverityLevel) {
        match severity {
            SeverityLevel::Contraindicated => self.contraindicated_count += 1,
            SeverityLevel::Serious => self.serious_count += 1,
            SeverityLevel::Significant => self.significant_count += 1,
            SeverityLevel::Minor => self.minor_count += 1,
        }
    }

    /// Interaction count for one severity
    pub fn count(&self, severity: SeverityLevel) -> u32 {
        match severity {
            SeverityLevel::Contraindicated => self.contraindicated_count,
            SeverityLevel::Serious => self.serious_count,
            SeverityLevel::Significant => self.significant_count,
            SeverityLevel::Minor => self.minor_count,
        }
    }

    /// Set the concurrent drug count and derive the polypharmacy flag
    pub fn with_drug_count(mut self, num_drugs: u32) -> Self {
        self.num_drugs = num_drugs;
        self.polypharmacy = num_drugs >= POLYPHARMACY_THRESHOLD;
        self
    }

    /// Feature values in [`FEATURE_NAMES`] order
    pub fn to_vector(&self) -> [f64; 12] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.contraindicated_count as f64,
            self.serious_count as f64,
            self.significant_count as f64,
            self.minor_count as f64,
            self.patient_age as f64,
            flag(self.is_geriatric),
            flag(self.has_renal_impairment),
            flag(self.has_hepatic_impairment),
            self.num_chronic_conditions as f64,
            flag(self.polypharmacy),
            self.num_allergies as f64,
            self.num_drugs as f64,
        ]
    }
}

/// Result of a risk scoring strategy
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Score in [0, 100]
    pub score: f64,

    /// Category derived from the score
    pub category: RiskCategory,

    /// Human-readable factors that drove the score
    pub contributing_factors: Vec<String>,

    /// Name of the strategy that produced the score
    pub strategy: String,

    /// Whether the primary strategy failed and the rule-based one was used
    pub fallback_used: bool,
}

impl RiskAssessment {
    /// Build an assessment, clamping the score and deriving the category
    pub fn new(score: f64, contributing_factors: Vec<String>, strategy: impl Into<String>) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
        Self {
            score,
            category: RiskCategory::from_score(score),
            contributing_factors,
            strategy: strategy.into(),
            fallback_used: false,
        }
    }
}
