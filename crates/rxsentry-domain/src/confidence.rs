//! Confidence fusion across local and external verification sources
//!
//! Each external source reports a tagged verdict. The score is derived from
//! those verdicts by a fixed, ordered decision list; the first rule that
//! matches wins. A source that is missing, slow or failing is treated as
//! "did not match", so the rules behave the same with zero, one or many
//! configured sources.

use std::collections::HashSet;
use std::fmt;

/// Default strength threshold separating strong from weak low-authority matches
///
/// For an adverse-event source the strength is the number of reported events.
pub const DEFAULT_STRENGTH_THRESHOLD: f64 = 100.0;

/// Confidence that an interaction is real, in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConfidenceScore(f64);

impl ConfidenceScore {
    /// Local match confirmed by every configured source
    pub const FULLY_CONFIRMED: ConfidenceScore = ConfidenceScore(1.0);
    /// Two or more independent external confirmations
    pub const MULTI_SOURCE: ConfidenceScore = ConfidenceScore(0.9);
    /// A single high-authority confirmation
    pub const HIGH_AUTHORITY: ConfidenceScore = ConfidenceScore(0.85);
    /// A single strong low-authority confirmation
    pub const STRONG_SIGNAL: ConfidenceScore = ConfidenceScore(0.75);
    /// A single weak low-authority confirmation
    pub const WEAK_SIGNAL: ConfidenceScore = ConfidenceScore(0.55);
    /// No external confirmation
    pub const UNCONFIRMED: ConfidenceScore = ConfidenceScore(0.3);

    /// Create a score, clamping into [0, 1]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// The raw value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// How much a source's confirmation is trusted on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceAuthority {
    /// Curated interaction knowledge base (e.g. RxNorm)
    High,
    /// Statistical or report-based signal (e.g. adverse event reports)
    Low,
}

/// Outcome reported by one external source for one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerdictOutcome {
    /// The source confirms the interaction with a source-specific strength
    Matched {
        /// Strength signal (e.g. event count); 0 when the source has none
        strength: f64,
    },
    /// The source was consulted and does not know the interaction
    NotMatched,
    /// The source could not be consulted (timeout, error, not configured)
    Unavailable,
}

impl VerdictOutcome {
    /// Whether the source confirmed the interaction
    pub fn is_match(&self) -> bool {
        matches!(self, VerdictOutcome::Matched { .. })
    }
}

/// A verdict from one external verification source
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalVerdict {
    /// Source identifier (e.g. "rxnorm", "openfda")
    pub source: String,

    /// Authority of the source
    pub authority: SourceAuthority,

    /// What the source reported
    pub outcome: VerdictOutcome,
}

impl ExternalVerdict {
    /// Create a verdict
    pub fn new(source: impl Into<String>, authority: SourceAuthority, outcome: VerdictOutcome) -> Self {
        Self {
            source: source.into(),
            authority,
            outcome,
        }
    }

    /// A verdict for a source that could not be consulted
    pub fn unavailable(source: impl Into<String>, authority: SourceAuthority) -> Self {
        Self::new(source, authority, VerdictOutcome::Unavailable)
    }
}

/// Configuration for confidence fusion
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
    /// Strength above which a low-authority match counts as strong
    pub strength_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
        }
    }
}

/// Compute the confidence for one pair
///
/// `verdicts` holds one entry per configured external source; sources that
/// could not be reached appear as [`VerdictOutcome::Unavailable`].
///
/// Decision list, first match wins:
/// 1. local match and every configured source matched (at least one) → 1.0
/// 2. two or more distinct sources matched → 0.9
/// 3. exactly one high-authority source matched → 0.85
/// 4. a low-authority source matched above the strength threshold → 0.75
/// 5. a low-authority source matched at or below the threshold → 0.55
/// 6. otherwise → 0.3
pub fn compute_confidence(
    local_match: bool,
    verdicts: &[ExternalVerdict],
    config: &ConfidenceConfig,
) -> ConfidenceScore {
    let matched: Vec<&ExternalVerdict> = verdicts.iter().filter(|v| v.outcome.is_match()).collect();

    let configured: HashSet<&str> = verdicts.iter().map(|v| v.source.as_str()).collect();
    let matched_sources: HashSet<&str> = matched.iter().map(|v| v.source.as_str()).collect();

    if local_match && !configured.is_empty() && matched_sources.len() == configured.len() {
        return ConfidenceScore::FULLY_CONFIRMED;
    }

    if matched_sources.len() >= 2 {
        return ConfidenceScore::MULTI_SOURCE;
    }

    let Some(single) = matched.first() else {
        return ConfidenceScore::UNCONFIRMED;
    };

    match (single.authority, single.outcome) {
        (SourceAuthority::High, _) => ConfidenceScore::HIGH_AUTHORITY,
        (SourceAuthority::Low, VerdictOutcome::Matched { strength })
            if strength > config.strength_threshold =>
        {
            ConfidenceScore::STRONG_SIGNAL
        }
        (SourceAuthority::Low, _) => ConfidenceScore::WEAK_SIGNAL,
    }
}

/// Identifiers of the sources that confirmed the interaction
pub fn confirming_sources(verdicts: &[ExternalVerdict]) -> Vec<String> {
    let mut seen = HashSet::new();
    verdicts
        .iter()
        .filter(|v| v.outcome.is_match())
        .filter(|v| seen.insert(v.source.clone()))
        .map(|v| v.source.clone())
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn outcome_strategy() -> impl Strategy<Value = VerdictOutcome> {
        prop_oneof![
            Just(VerdictOutcome::NotMatched),
            Just(VerdictOutcome::Unavailable),
            (0.0f64..1000.0).prop_map(|strength| VerdictOutcome::Matched { strength }),
        ]
    }

    fn verdicts_strategy() -> impl Strategy<Value = Vec<ExternalVerdict>> {
        prop::collection::vec((outcome_strategy(), any::<bool>()), 0..5).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (outcome, high))| {
                    let authority = if high { SourceAuthority::High } else { SourceAuthority::Low };
                    ExternalVerdict::new(format!("source{}", i), authority, outcome)
                })
                .collect()
        })
    }

    proptest! {
        /// Property: an additional confirmation never lowers confidence
        #[test]
        fn test_confirmation_is_monotonic(
            verdicts in verdicts_strategy(),
            index in any::<prop::sample::Index>(),
            strength in 0.0f64..1000.0,
            local in any::<bool>(),
        ) {
            prop_assume!(!verdicts.is_empty());
            let i = index.index(verdicts.len());
            prop_assume!(!verdicts[i].outcome.is_match());

            let config = ConfidenceConfig::default();
            let before = compute_confidence(local, &verdicts, &config);

            let mut confirmed = verdicts.clone();
            confirmed[i].outcome = VerdictOutcome::Matched { strength };
            let after = compute_confidence(local, &confirmed, &config);

            prop_assert!(after.value() >= before.value(),
                "confidence dropped from {} to {}", before, after);
        }

        /// Property: scores are always one of the fixed rule values
        #[test]
        fn test_score_is_rule_value(verdicts in verdicts_strategy(), local in any::<bool>()) {
            let score = compute_confidence(local, &verdicts, &ConfidenceConfig::default()).value();
            prop_assert!([1.0, 0.9, 0.85, 0.75, 0.55, 0.3].contains(&score));
        }
    }
}
