//! Catalog seed file format and conversions to domain types
//!
//! A seed is a JSON document with `drugs`, `interactions` and `patients`
//! arrays. Records are validated while converting; a bad record fails the
//! whole load rather than being skipped.

use crate::StoreError;
use rxsentry_domain::{Allergy, Drug, DrugId, InteractionFact, PatientProfile, SeverityLevel, Sex};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level seed document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    /// Drug records
    #[serde(default)]
    pub drugs: Vec<DrugRecord>,

    /// Interaction records (indexed in the stored direction only)
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,

    /// Patient records
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
}

/// Serialized drug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugRecord {
    /// Catalog identifier
    pub drug_id: String,
    /// Display name
    pub drug_name: String,
    /// Generic name (defaults to the display name)
    #[serde(default)]
    pub generic_name: Option<String>,
    /// Therapeutic classes
    #[serde(default)]
    pub classes: Vec<String>,
    /// RxNorm concept id
    #[serde(default)]
    pub rxcui: Option<String>,
}

/// Serialized interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Catalog identifier
    pub interaction_id: String,
    /// First drug as stored
    pub drug_a: String,
    /// Second drug as stored
    pub drug_b: String,
    /// Severity name (case-insensitive)
    pub severity_level: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Clinical effects
    #[serde(default)]
    pub clinical_effects: String,
    /// Management guidance
    #[serde(default)]
    pub management_recommendations: String,
    /// Adverse outcomes documented in the literature
    #[serde(default)]
    pub documented_adverse_outcomes: bool,
}

/// Serialized allergy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyRecord {
    /// Allergen (drug name or class)
    pub allergen: String,
    /// Severity
    #[serde(default = "default_allergy_severity")]
    pub severity: String,
    /// Reaction
    #[serde(default)]
    pub reaction: String,
}

fn default_allergy_severity() -> String {
    "unknown".to_string()
}

/// Serialized patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Catalog identifier
    pub patient_id: String,
    /// Age in years
    pub age: u32,
    /// Weight in kg
    pub weight_kg: f64,
    /// "male" / "female"
    pub sex: String,
    /// Serum creatinine (mg/dL)
    #[serde(default)]
    pub serum_creatinine: Option<f64>,
    /// Known renal impairment
    #[serde(default)]
    pub renal_impairment: bool,
    /// Known hepatic impairment
    #[serde(default)]
    pub hepatic_impairment: bool,
    /// Chronic condition count
    #[serde(default)]
    pub chronic_conditions: u32,
    /// Allergies
    #[serde(default)]
    pub allergies: Vec<AllergyRecord>,
    /// Current medication count
    #[serde(default)]
    pub current_drug_count: u32,
}

impl CatalogSeed {
    /// Parse a seed from JSON text
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a seed file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl TryFrom<DrugRecord> for Drug {
    type Error = StoreError;

    fn try_from(record: DrugRecord) -> Result<Self, Self::Error> {
        let id = DrugId::new(record.drug_id);
        if id.is_empty() {
            return Err(StoreError::InvalidData("drug_id must not be empty".to_string()));
        }
        Ok(Drug {
            id,
            generic_name: record.generic_name.unwrap_or_else(|| record.drug_name.clone()),
            name: record.drug_name,
            classes: record.classes,
            rxcui: record.rxcui,
        })
    }
}

impl TryFrom<InteractionRecord> for InteractionFact {
    type Error = StoreError;

    fn try_from(record: InteractionRecord) -> Result<Self, Self::Error> {
        let severity = SeverityLevel::parse(&record.severity_level).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "Unknown severity '{}' on interaction {}",
                record.severity_level, record.interaction_id
            ))
        })?;

        let mut fact = InteractionFact::new(
            record.interaction_id,
            DrugId::new(record.drug_a),
            DrugId::new(record.drug_b),
            severity,
        )
        .with_description(record.description)
        .with_clinical_effects(record.clinical_effects)
        .with_management(record.management_recommendations);
        fact.documented_adverse_outcomes = record.documented_adverse_outcomes;
        Ok(fact)
    }
}

impl TryFrom<PatientRecord> for PatientProfile {
    type Error = StoreError;

    fn try_from(record: PatientRecord) -> Result<Self, Self::Error> {
        let sex = Sex::parse(&record.sex).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "Invalid sex '{}' on patient {}",
                record.sex, record.patient_id
            ))
        })?;

        Ok(PatientProfile {
            id: record.patient_id,
            age: record.age,
            weight_kg: record.weight_kg,
            sex,
            serum_creatinine: record.serum_creatinine,
            renal_impairment: record.renal_impairment,
            hepatic_impairment: record.hepatic_impairment,
            chronic_conditions: record.chronic_conditions,
            allergies: record
                .allergies
                .into_iter()
                .map(|a| Allergy::new(a.allergen, a.severity, a.reaction))
                .collect(),
            current_drug_count: record.current_drug_count,
        })
    }
}
