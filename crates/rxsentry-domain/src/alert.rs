//! Alert set - the subset of interactions selected for display

use crate::{ConfidenceScore, InteractionFact, SeverityLevel};
use std::collections::BTreeMap;

/// An interaction enriched for ranking and display
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredInteraction {
    /// The canonical fact
    pub fact: InteractionFact,

    /// Confidence that the interaction is real
    pub confidence: ConfidenceScore,

    /// Sources that confirmed the interaction
    pub confirmed_by: Vec<String>,

    /// Ranking value used only for truncation
    pub priority: f64,

    /// Position in detection order (tie-breaker)
    pub detection_index: usize,
}

impl ScoredInteraction {
    /// Severity of the underlying fact
    pub fn severity(&self) -> SeverityLevel {
        self.fact.severity
    }
}

/// Interactions selected for display plus per-severity accounting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertSet {
    /// Displayed interactions, concatenated in severity order
    pub alerts: Vec<ScoredInteraction>,

    /// Shown count per severity (all four keys present)
    pub shown: BTreeMap<SeverityLevel, usize>,

    /// Filtered count per severity (all four keys present)
    pub filtered: BTreeMap<SeverityLevel, usize>,

    /// Why lower-priority alerts were dropped, when any were
    pub filtering_reason: Option<String>,
}

impl AlertSet {
    /// Create an empty set with every severity key initialised to zero
    pub fn empty() -> Self {
        let zeroes: BTreeMap<SeverityLevel, usize> =
            SeverityLevel::ALL.iter().map(|s| (*s, 0)).collect();
        Self {
            alerts: Vec::new(),
            shown: zeroes.clone(),
            filtered: zeroes,
            filtering_reason: None,
        }
    }

    /// Total number of displayed alerts
    pub fn total_shown(&self) -> usize {
        self.shown.values().sum()
    }

    /// Total number of filtered alerts
    pub fn total_filtered(&self) -> usize {
        self.filtered.values().sum()
    }

    /// Total number of interactions considered
    pub fn total(&self) -> usize {
        self.total_shown() + self.total_filtered()
    }

    /// Whether any displayed alert has the given severity
    pub fn contains_severity(&self, severity: SeverityLevel) -> bool {
        self.shown.get(&severity).copied().unwrap_or(0) > 0
    }
}
