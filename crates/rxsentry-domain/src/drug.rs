//! Drug reference data

use std::fmt;

/// Catalog identifier of a drug
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrugId(String);

impl DrugId {
    /// Create a drug identifier, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DrugId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DrugId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A drug as known to the reference catalog
///
/// Immutable reference data; only the catalog creates or updates drugs.
#[derive(Debug, Clone, PartialEq)]
pub struct Drug {
    /// Catalog identifier
    pub id: DrugId,

    /// Display name (brand or common name)
    pub name: String,

    /// Generic (non-proprietary) name
    pub generic_name: String,

    /// Therapeutic class tags (e.g. "anticoagulant", "nsaid")
    pub classes: Vec<String>,

    /// RxNorm concept identifier, when known
    pub rxcui: Option<String>,
}

impl Drug {
    /// Create a drug with a single name used as both display and generic name
    pub fn new(id: impl Into<DrugId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            generic_name: name.clone(),
            name,
            classes: Vec::new(),
            rxcui: None,
        }
    }

    /// Set the generic name
    pub fn with_generic_name(mut self, generic_name: impl Into<String>) -> Self {
        self.generic_name = generic_name.into();
        self
    }

    /// Add a therapeutic class tag
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set the RxNorm concept identifier
    pub fn with_rxcui(mut self, rxcui: impl Into<String>) -> Self {
        self.rxcui = Some(rxcui.into());
        self
    }

    /// Whether the drug carries the given class tag (case-insensitive)
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Whether the drug belongs to any of the given classes
    pub fn in_any_class<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        classes.iter().any(|c| self.has_class(c.as_ref()))
    }

    /// Whether `term` names this drug by display or generic name (case-insensitive)
    pub fn is_named(&self, term: &str) -> bool {
        let term = term.trim();
        self.name.eq_ignore_ascii_case(term) || self.generic_name.eq_ignore_ascii_case(term)
    }
}
