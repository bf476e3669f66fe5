//! Interaction facts between drug pairs

use crate::{DrugId, SeverityLevel};
use std::fmt;

/// An unordered pair of drug identifiers
///
/// The pair is stored in canonical (sorted) order so that `(a, b)` and
/// `(b, a)` compare and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrugPair {
    first: DrugId,
    second: DrugId,
}

impl DrugPair {
    /// Create a pair; argument order does not matter
    pub fn new(a: DrugId, b: DrugId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The lexicographically smaller identifier
    pub fn first(&self) -> &DrugId {
        &self.first
    }

    /// The lexicographically larger identifier
    pub fn second(&self) -> &DrugId {
        &self.second
    }

    /// Whether the pair includes `id`
    pub fn contains(&self, id: &DrugId) -> bool {
        &self.first == id || &self.second == id
    }

}

impl fmt::Display for DrugPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}

/// A documented interaction between two drugs
///
/// Severity is symmetric: the order of the pair never changes its meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionFact {
    /// Catalog identifier of the interaction record
    pub id: String,

    /// The two interacting drugs
    pub pair: DrugPair,

    /// Danger tier
    pub severity: SeverityLevel,

    /// Clinical description of the interaction
    pub description: String,

    /// Observable clinical effects
    pub clinical_effects: String,

    /// Management guidance
    pub management: String,

    /// Whether adverse outcomes are documented in the literature
    pub documented_adverse_outcomes: bool,
}

impl InteractionFact {
    /// Create a fact with empty narrative fields
    pub fn new(
        id: impl Into<String>,
        a: impl Into<DrugId>,
        b: impl Into<DrugId>,
        severity: SeverityLevel,
    ) -> Self {
        Self {
            id: id.into(),
            pair: DrugPair::new(a.into(), b.into()),
            severity,
            description: String::new(),
            clinical_effects: String::new(),
            management: String::new(),
            documented_adverse_outcomes: false,
        }
    }

    /// Set the description text
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the clinical effects text
    pub fn with_clinical_effects(mut self, effects: impl Into<String>) -> Self {
        self.clinical_effects = effects.into();
        self
    }

    /// Set the management guidance text
    pub fn with_management(mut self, management: impl Into<String>) -> Self {
        self.management = management.into();
        self
    }

    /// Mark the fact as backed by adverse-outcome literature
    pub fn with_documented_adverse_outcomes(mut self) -> Self {
        self.documented_adverse_outcomes = true;
        self
    }
}

/// A fact found during detection, tagged with its detection position
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedInteraction {
    /// The input pair the catalog was queried for
    pub pair: DrugPair,

    /// The canonical fact for the pair
    pub fact: InteractionFact,

    /// Position of the pair in input enumeration order (tie-breaker)
    pub detection_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pair_is_unordered() {
        let ab = DrugPair::new(DrugId::new("A"), DrugId::new("B"));
        let ba = DrugPair::new(DrugId::new("B"), DrugId::new("A"));
        assert_eq!(ab, ba);
        assert_eq!(ab.first().as_str(), "A");

        let mut set = HashSet::new();
        set.insert(ab);
        assert!(set.contains(&ba));
    }

    #[test]
    fn test_pairs_with_separator_in_ids_stay_distinct() {
        let left = DrugPair::new(DrugId::new("A|B"), DrugId::new("C"));
        let right = DrugPair::new(DrugId::new("A"), DrugId::new("B|C"));
        assert_ne!(left, right);

        let mut set = HashSet::new();
        set.insert(left);
        assert!(!set.contains(&right));
    }

    #[test]
    fn test_pair_contains() {
        let pair = DrugPair::new(DrugId::new("X"), DrugId::new("Y"));
        assert!(pair.contains(&DrugId::new("Y")));
        assert!(!pair.contains(&DrugId::new("Z")));
    }

    #[test]
    fn test_fact_builder() {
        let fact = InteractionFact::new("I1", "B", "A", SeverityLevel::Serious)
            .with_description("Bleeding risk")
            .with_documented_adverse_outcomes();
        assert_eq!(fact.pair.first().as_str(), "A");
        assert_eq!(fact.description, "Bleeding risk");
        assert!(fact.documented_adverse_outcomes);
    }
}
