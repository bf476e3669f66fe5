//! Severity model - the four danger tiers of a drug pair

use std::fmt;

/// Severity of an interaction between two drugs
///
/// Variants are declared from most to least dangerous, so the derived
/// ordering sorts the most dangerous tier first:
/// `Contraindicated < Serious < Significant < Minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityLevel {
    /// The combination must not be used
    Contraindicated,

    /// Use only with close monitoring or an alternative
    Serious,

    /// Clinically relevant, monitor
    Significant,

    /// Minimal clinical effect
    Minor,
}

impl SeverityLevel {
    /// All severities, most dangerous first
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Contraindicated,
        SeverityLevel::Serious,
        SeverityLevel::Significant,
        SeverityLevel::Minor,
    ];

    /// Weight used by the simple interaction risk sum
    pub fn weight(&self) -> f64 {
        match self {
            SeverityLevel::Contraindicated => 10.0,
            SeverityLevel::Serious => 5.0,
            SeverityLevel::Significant => 2.0,
            SeverityLevel::Minor => 0.5,
        }
    }

    /// Base value for alert priority scoring
    pub fn base_priority(&self) -> f64 {
        match self {
            SeverityLevel::Contraindicated => 100.0,
            SeverityLevel::Serious => 75.0,
            SeverityLevel::Significant => 50.0,
            SeverityLevel::Minor => 25.0,
        }
    }

    /// Whether every fact of this severity must always be shown
    pub fn requires_full_recall(&self) -> bool {
        matches!(self, SeverityLevel::Contraindicated | SeverityLevel::Serious)
    }

    /// Get the severity name as an upper-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Contraindicated => "CONTRAINDICATED",
            SeverityLevel::Serious => "SERIOUS",
            SeverityLevel::Significant => "SIGNIFICANT",
            SeverityLevel::Minor => "MINOR",
        }
    }

    /// Parse a severity, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CONTRAINDICATED" => Some(SeverityLevel::Contraindicated),
            "SERIOUS" => Some(SeverityLevel::Serious),
            "SIGNIFICANT" => Some(SeverityLevel::Significant),
            "MINOR" => Some(SeverityLevel::Minor),
            _ => None,
        }
    }

    /// Return the more dangerous of two severities
    pub fn most_severe(self, other: SeverityLevel) -> SeverityLevel {
        if other < self {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid severity level: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_most_dangerous_first() {
        let mut levels = vec![
            SeverityLevel::Minor,
            SeverityLevel::Contraindicated,
            SeverityLevel::Significant,
            SeverityLevel::Serious,
        ];
        levels.sort();
        assert_eq!(levels, SeverityLevel::ALL.to_vec());
    }

    #[test]
    fn test_weights_and_priorities() {
        assert_eq!(SeverityLevel::Contraindicated.weight(), 10.0);
        assert_eq!(SeverityLevel::Minor.weight(), 0.5);
        assert_eq!(SeverityLevel::Serious.base_priority(), 75.0);
        assert_eq!(SeverityLevel::Minor.base_priority(), 25.0);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(SeverityLevel::parse("serious"), Some(SeverityLevel::Serious));
        assert_eq!("Minor".parse::<SeverityLevel>(), Ok(SeverityLevel::Minor));
        assert!(SeverityLevel::parse("moderate").is_none());
    }

    #[test]
    fn test_most_severe() {
        assert_eq!(
            SeverityLevel::Minor.most_severe(SeverityLevel::Serious),
            SeverityLevel::Serious
        );
        assert_eq!(
            SeverityLevel::Contraindicated.most_severe(SeverityLevel::Significant),
            SeverityLevel::Contraindicated
        );
    }

    #[test]
    fn test_full_recall_classes() {
        assert!(SeverityLevel::Contraindicated.requires_full_recall());
        assert!(SeverityLevel::Serious.requires_full_recall());
        assert!(!SeverityLevel::Significant.requires_full_recall());
        assert!(!SeverityLevel::Minor.requires_full_recall());
    }
}
