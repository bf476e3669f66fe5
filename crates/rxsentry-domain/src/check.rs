//! Check identifiers and allergy alerts

use std::fmt;

/// Unique identifier of one interaction check, based on UUIDv7
///
/// UUIDv7 keeps check identifiers chronologically sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckId(u128);

impl CheckId {
    /// Generate a new UUIDv7-based CheckId
    ///
    /// # Examples
    ///
    /// ```
    /// use rxsentry_domain::CheckId;
    ///
    /// let id = CheckId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a CheckId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid check id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since Unix epoch encoded in the identifier
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for CheckId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// How an allergy record matched a checked drug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllergyMatch {
    /// Allergen names the drug itself
    Direct,
    /// Allergen names a therapeutic class the drug belongs to
    Class,
}

impl AllergyMatch {
    /// Get the match kind as a lower-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergyMatch::Direct => "direct",
            AllergyMatch::Class => "class",
        }
    }
}

/// A checked drug that conflicts with a recorded allergy
#[derive(Debug, Clone, PartialEq)]
pub struct AllergyAlert {
    /// Allergen as recorded
    pub allergen: String,
    /// Catalog id of the matched drug
    pub drug_id: String,
    /// Display name of the matched drug
    pub drug_name: String,
    /// How the allergen matched
    pub match_kind: AllergyMatch,
    /// Recorded allergy severity
    pub severity: String,
    /// Recorded reaction
    pub reaction: String,
    /// Suggested action
    pub recommendation: String,
}
