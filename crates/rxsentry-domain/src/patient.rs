//! Patient profile - optional, read-only input to a check

/// Age at which a patient is considered geriatric
pub const GERIATRIC_AGE: u32 = 65;

/// Age at which the additional advanced-age priority factor applies
pub const ADVANCED_AGE: u32 = 75;

/// Biological sex, as used by the Cockcroft-Gault formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    /// Male
    Male,
    /// Female
    Female,
}

impl Sex {
    /// Get the sex as a lower-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    /// Parse from common spellings ("M", "female", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Sex::Male),
            "f" | "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid sex: {}", s))
    }
}

/// A recorded allergy
#[derive(Debug, Clone, PartialEq)]
pub struct Allergy {
    /// Allergen: a drug name or a therapeutic class
    pub allergen: String,

    /// Recorded severity ("mild", "moderate", "severe")
    pub severity: String,

    /// Reaction description
    pub reaction: String,
}

impl Allergy {
    /// Create an allergy record
    pub fn new(
        allergen: impl Into<String>,
        severity: impl Into<String>,
        reaction: impl Into<String>,
    ) -> Self {
        Self {
            allergen: allergen.into(),
            severity: severity.into(),
            reaction: reaction.into(),
        }
    }
}

/// Patient characteristics relevant to interaction risk
#[derive(Debug, Clone, PartialEq)]
pub struct PatientProfile {
    /// Catalog identifier
    pub id: String,

    /// Age in years
    pub age: u32,

    /// Weight in kilograms
    pub weight_kg: f64,

    /// Biological sex
    pub sex: Sex,

    /// Serum creatinine in mg/dL, when measured
    pub serum_creatinine: Option<f64>,

    /// Known renal impairment
    pub renal_impairment: bool,

    /// Known hepatic impairment
    pub hepatic_impairment: bool,

    /// Number of chronic conditions
    pub chronic_conditions: u32,

    /// Recorded allergies
    pub allergies: Vec<Allergy>,

    /// Number of drugs the patient currently takes
    pub current_drug_count: u32,
}

impl PatientProfile {
    /// Create a profile with no risk factors
    pub fn new(id: impl Into<String>, age: u32, weight_kg: f64, sex: Sex) -> Self {
        Self {
            id: id.into(),
            age,
            weight_kg,
            sex,
            serum_creatinine: None,
            renal_impairment: false,
            hepatic_impairment: false,
            chronic_conditions: 0,
            allergies: Vec::new(),
            current_drug_count: 0,
        }
    }

    /// Whether the patient is 65 or older
    pub fn is_geriatric(&self) -> bool {
        self.age >= GERIATRIC_AGE
    }

    /// Whether the patient is 75 or older
    pub fn is_advanced_age(&self) -> bool {
        self.age >= ADVANCED_AGE
    }

    /// Number of known allergies
    pub fn allergy_count(&self) -> u32 {
        self.allergies.len() as u32
    }

    /// Concurrent drug count given the size of the drug list being checked
    ///
    /// The larger of the recorded medication count and the checked list.
    pub fn concurrent_drugs(&self, checked: usize) -> u32 {
        self.current_drug_count.max(checked as u32)
    }
}
