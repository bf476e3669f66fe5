//! Patient-specific dose adjustment
//!
//! Renal adjustment classifies Cockcroft-Gault creatinine clearance; hepatic
//! adjustment classifies the Child-Pugh score. Each path has its own per-drug
//! table. A drug listed in a table with no record for the patient's category
//! keeps the standard dose; a drug missing from the table altogether is an
//! [`EngineError::UnknownDrug`].

use crate::EngineError;
use rxsentry_domain::dose::{
    child_pugh_score, cockcroft_gault, ChildPughClass, DoseAdjustment, DoseAdjustmentResult,
    FunctionCategory, HepaticPanel, RenalCategory,
};
use rxsentry_domain::patient::GERIATRIC_AGE;
use rxsentry_domain::Sex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_TABLES: &str = include_str!("../data/dose_tables.json");

#[derive(Deserialize)]
struct AdjustmentRecord {
    factor: f64,
    rationale: String,
}

#[derive(Deserialize)]
struct DoseTablesFile {
    #[serde(default)]
    renal: HashMap<String, HashMap<String, AdjustmentRecord>>,
    #[serde(default)]
    hepatic: HashMap<String, HashMap<String, AdjustmentRecord>>,
    #[serde(default)]
    geriatric_warnings: HashMap<String, String>,
}

/// Per-drug adjustment tables plus the geriatric warning list
#[derive(Debug, Clone, Default)]
pub struct DoseTables {
    renal: HashMap<String, HashMap<RenalCategory, DoseAdjustment>>,
    hepatic: HashMap<String, HashMap<ChildPughClass, DoseAdjustment>>,
    geriatric_warnings: HashMap<String, String>,
}

fn convert_records<K, F>(
    table: &str,
    drugs: HashMap<String, HashMap<String, AdjustmentRecord>>,
    parse: F,
) -> Result<HashMap<String, HashMap<K, DoseAdjustment>>, EngineError>
where
    K: std::hash::Hash + Eq,
    F: Fn(&str) -> Option<K>,
{
    let mut converted = HashMap::with_capacity(drugs.len());
    for (drug_id, records) in drugs {
        let mut by_category = HashMap::with_capacity(records.len());
        for (category, record) in records {
            let key = parse(&category).ok_or_else(|| {
                EngineError::Config(format!(
                    "{} table: unknown category '{}' for {}",
                    table, category, drug_id
                ))
            })?;
            if !record.factor.is_finite() || !(0.0..=1.0).contains(&record.factor) {
                return Err(EngineError::Config(format!(
                    "{} table: factor {} for {} ({}) is outside [0, 1]",
                    table, record.factor, drug_id, category
                )));
            }
            by_category.insert(key, DoseAdjustment::new(record.factor, record.rationale));
        }
        converted.insert(drug_id.trim().to_string(), by_category);
    }
    Ok(converted)
}

impl DoseTables {
    /// Parse tables from JSON text
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: DoseTablesFile = serde_json::from_str(json)?;
        Ok(Self {
            renal: convert_records("renal", file.renal, RenalCategory::parse)?,
            hepatic: convert_records("hepatic", file.hepatic, ChildPughClass::parse)?,
            geriatric_warnings: file
                .geriatric_warnings
                .into_iter()
                .map(|(id, warning)| (id.trim().to_string(), warning))
                .collect(),
        })
    }

    /// Load tables from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read dose tables {}: {}", path.display(), e))
        })?;
        let tables = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            renal_drugs = tables.renal.len(),
            hepatic_drugs = tables.hepatic.len(),
            "Dose tables loaded"
        );
        Ok(tables)
    }

    /// Built-in reference tables
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_json(BUILTIN_TABLES)
    }

    /// Add or replace a renal record
    pub fn set_renal(&mut self, drug_id: &str, category: RenalCategory, adjustment: DoseAdjustment) {
        self.renal
            .entry(drug_id.to_string())
            .or_default()
            .insert(category, adjustment);
    }

    /// Add or replace a hepatic record
    pub fn set_hepatic(&mut self, drug_id: &str, class: ChildPughClass, adjustment: DoseAdjustment) {
        self.hepatic
            .entry(drug_id.to_string())
            .or_default()
            .insert(class, adjustment);
    }

    /// Mark a drug as high-risk in the elderly
    pub fn set_geriatric_warning(&mut self, drug_id: &str, warning: impl Into<String>) {
        self.geriatric_warnings.insert(drug_id.to_string(), warning.into());
    }
}

/// Renal dose adjustment input
#[derive(Debug, Clone, PartialEq)]
pub struct RenalDoseRequest {
    /// Drug identifier
    pub drug_id: String,
    /// Standard (unadjusted) dose
    pub standard_dose: f64,
    /// Dose unit
    pub unit: String,
    /// Age in years
    pub age: u32,
    /// Weight in kg
    pub weight_kg: f64,
    /// Serum creatinine in mg/dL
    pub serum_creatinine: f64,
    /// Patient sex
    pub sex: Sex,
}

/// Hepatic dose adjustment input
#[derive(Debug, Clone, PartialEq)]
pub struct HepaticDoseRequest {
    /// Drug identifier
    pub drug_id: String,
    /// Standard (unadjusted) dose
    pub standard_dose: f64,
    /// Dose unit
    pub unit: String,
    /// Age in years
    pub age: u32,
    /// Child-Pugh inputs
    pub panel: HepaticPanel,
}

/// Stateless dose calculator over a set of tables
#[derive(Debug, Clone)]
pub struct DoseCalculator {
    tables: DoseTables,
}

fn require_positive(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!("{} must be a positive number", name)))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!("{} must be a non-negative number", name)))
    }
}

/// Shared outcome of a table lookup
struct Applied {
    factor: f64,
    adjusted_dose: f64,
    rationale: String,
    contraindicated: bool,
    defined: bool,
}

fn apply(adjustment: Option<&DoseAdjustment>, standard_dose: f64, undefined_rationale: String) -> Applied {
    match adjustment {
        Some(adjustment) => Applied {
            factor: adjustment.factor,
            adjusted_dose: if adjustment.is_contraindicated() {
                0.0
            } else {
                standard_dose * adjustment.factor
            },
            rationale: adjustment.rationale.clone(),
            contraindicated: adjustment.is_contraindicated(),
            defined: true,
        },
        None => Applied {
            factor: 1.0,
            adjusted_dose: standard_dose,
            rationale: undefined_rationale,
            contraindicated: false,
            defined: false,
        },
    }
}

fn reduction_advice(applied: &Applied) -> Option<String> {
    if applied.defined && !applied.contraindicated && applied.factor < 1.0 {
        Some(format!(
            "Dose reduced to {:.0}% of standard; monitor for loss of efficacy and for toxicity.",
            applied.factor * 100.0
        ))
    } else {
        None
    }
}

impl DoseCalculator {
    /// Create a calculator over `tables`
    pub fn new(tables: DoseTables) -> Self {
        Self { tables }
    }

    /// Calculator over the built-in tables
    pub fn builtin() -> Result<Self, EngineError> {
        Ok(Self::new(DoseTables::builtin()?))
    }

    fn geriatric_warnings(&self, drug_id: &str, age: u32, warnings: &mut Vec<String>, recommendations: &mut Vec<String>) {
        if age < GERIATRIC_AGE {
            return;
        }
        if let Some(warning) = self.tables.geriatric_warnings.get(drug_id) {
            warnings.push(format!("Geriatric patient (age {}): {}", age, warning));
            recommendations.push("Start low and titrate slowly; reassess need at every review.".to_string());
        }
    }

    /// Renal dose adjustment by Cockcroft-Gault creatinine clearance
    pub fn renal(&self, request: &RenalDoseRequest) -> Result<DoseAdjustmentResult, EngineError> {
        require_non_negative("standard_dose", request.standard_dose)?;
        require_positive("weight_kg", request.weight_kg)?;
        require_positive("serum_creatinine", request.serum_creatinine)?;

        let drug_id = request.drug_id.trim();
        let records = self
            .tables
            .renal
            .get(drug_id)
            .ok_or_else(|| EngineError::UnknownDrug(format!("{} has no renal dosing record", drug_id)))?;

        let crcl = cockcroft_gault(request.age, request.weight_kg, request.serum_creatinine, request.sex);
        let category = RenalCategory::from_crcl(crcl);
        let applied = apply(
            records.get(&category),
            request.standard_dose,
            format!(
                "No renal adjustment defined for {} renal function; standard dose applies.",
                category.as_str().to_lowercase()
            ),
        );

        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        if applied.contraindicated {
            warnings.push(format!(
                "Contraindicated with {} renal function (CrCl {:.1} mL/min).",
                category.as_str(),
                crcl
            ));
            recommendations.push("Select an alternative agent that is not renally cleared.".to_string());
        }
        recommendations.extend(reduction_advice(&applied));
        match category {
            RenalCategory::Normal => {}
            RenalCategory::Mild => {
                recommendations.push("Monitor renal function periodically.".to_string());
            }
            RenalCategory::Moderate => {
                recommendations.push(
                    "Monitor serum creatinine and reassess the dose if renal function changes.".to_string(),
                );
            }
            RenalCategory::Severe => {
                recommendations.push(
                    "Monitor renal function at least weekly; consider nephrology consultation.".to_string(),
                );
            }
            RenalCategory::Esrd => {
                recommendations.push(
                    "Coordinate dosing with the dialysis schedule; consult nephrology.".to_string(),
                );
            }
        }
        self.geriatric_warnings(drug_id, request.age, &mut warnings, &mut recommendations);

        debug!(
            drug_id,
            crcl,
            category = category.as_str(),
            factor = applied.factor,
            "Renal dose calculated"
        );

        Ok(DoseAdjustmentResult {
            drug_id: drug_id.to_string(),
            original_dose: request.standard_dose,
            unit: request.unit.clone(),
            adjustment_factor: applied.factor,
            adjusted_dose: applied.adjusted_dose,
            category: FunctionCategory::Renal(category),
            creatinine_clearance: Some(crcl),
            child_pugh_score: None,
            rationale: applied.rationale,
            warnings,
            contraindicated: applied.contraindicated,
            adjustment_defined: applied.defined,
            recommendations,
        })
    }

    /// Hepatic dose adjustment by Child-Pugh class
    pub fn hepatic(&self, request: &HepaticDoseRequest) -> Result<DoseAdjustmentResult, EngineError> {
        require_non_negative("standard_dose", request.standard_dose)?;
        require_non_negative("bilirubin", request.panel.bilirubin)?;
        require_non_negative("albumin", request.panel.albumin)?;
        require_non_negative("inr", request.panel.inr)?;

        let drug_id = request.drug_id.trim();
        let records = self
            .tables
            .hepatic
            .get(drug_id)
            .ok_or_else(|| EngineError::UnknownDrug(format!("{} has no hepatic dosing record", drug_id)))?;

        let score = child_pugh_score(&request.panel);
        let class = ChildPughClass::from_score(score);
        let applied = apply(
            records.get(&class),
            request.standard_dose,
            format!(
                "No hepatic adjustment defined for Child-Pugh class {}; standard dose applies.",
                class.as_str()
            ),
        );

        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        if applied.contraindicated {
            warnings.push(format!(
                "Contraindicated in Child-Pugh class {} (score {}).",
                class.as_str(),
                score
            ));
            recommendations.push("Select an alternative agent without significant hepatic metabolism.".to_string());
        }
        recommendations.extend(reduction_advice(&applied));
        recommendations.push(
            match class {
                ChildPughClass::A => "Monitor liver function tests periodically.",
                ChildPughClass::B => "Monitor liver function tests and clinical signs of toxicity closely.",
                ChildPughClass::C => "Avoid hepatotoxic agents where possible; consult hepatology.",
            }
            .to_string(),
        );
        self.geriatric_warnings(drug_id, request.age, &mut warnings, &mut recommendations);

        debug!(drug_id, score, class = class.as_str(), factor = applied.factor, "Hepatic dose calculated");

        Ok(DoseAdjustmentResult {
            drug_id: drug_id.to_string(),
            original_dose: request.standard_dose,
            unit: request.unit.clone(),
            adjustment_factor: applied.factor,
            adjusted_dose: applied.adjusted_dose,
            category: FunctionCategory::Hepatic(class),
            creatinine_clearance: None,
            child_pugh_score: Some(score),
            rationale: applied.rationale,
            warnings,
            contraindicated: applied.contraindicated,
            adjustment_defined: applied.defined,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxsentry_domain::dose::ClinicalGrade;

    fn renal_request(drug_id: &str, age: u32, weight: f64, scr: f64) -> RenalDoseRequest {
        RenalDoseRequest {
            drug_id: drug_id.to_string(),
            standard_dose: 1000.0,
            unit: "mg".to_string(),
            age,
            weight_kg: weight,
            serum_creatinine: scr,
            sex: Sex::Male,
        }
    }

    fn calculator() -> DoseCalculator {
        DoseCalculator::builtin().unwrap()
    }

    #[test]
    fn test_builtin_tables_parse() {
        let tables = DoseTables::builtin().unwrap();
        assert!(tables.renal.contains_key("DRUG_006"));
        assert!(tables.hepatic.contains_key("DRUG_004"));
        assert!(tables.geriatric_warnings.contains_key("DRUG_015"));
    }

    #[test]
    fn test_moderate_half_dose() {
        // 75 y, 70 kg, SCr 1.8 -> CrCl 35.1 -> Moderate
        let result = calculator().renal(&renal_request("DRUG_006", 75, 70.0, 1.8)).unwrap();
        assert_eq!(result.category, FunctionCategory::Renal(RenalCategory::Moderate));
        assert!((result.creatinine_clearance.unwrap() - 35.1).abs() < 0.05);
        assert_eq!(result.adjustment_factor, 0.5);
        assert_eq!(result.adjusted_dose, 500.0);
        assert!(!result.contraindicated);
        assert!(result.adjustment_defined);
    }

    #[test]
    fn test_zero_factor_contraindicated() {
        // 80 y, 50 kg, SCr 2.5 -> CrCl 16.7 -> Severe
        let result = calculator().renal(&renal_request("DRUG_006", 80, 50.0, 2.5)).unwrap();
        assert_eq!(result.category, FunctionCategory::Renal(RenalCategory::Severe));
        assert_eq!(result.adjusted_dose, 0.0);
        assert_eq!(result.adjustment_factor, 0.0);
        assert!(result.contraindicated);
        assert!(result.adjustment_defined);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_no_record_for_category_keeps_standard_dose() {
        // Warfarin is listed with no renal records
        let result = calculator().renal(&renal_request("DRUG_001", 40, 80.0, 1.0)).unwrap();
        assert_eq!(result.adjusted_dose, 1000.0);
        assert_eq!(result.adjustment_factor, 1.0);
        assert!(!result.adjustment_defined);
        assert!(!result.contraindicated);
        assert!(result.rationale.contains("No renal adjustment defined"));
    }

    #[test]
    fn test_unknown_drug() {
        let result = calculator().renal(&renal_request("DRUG_999", 40, 80.0, 1.0));
        assert!(matches!(result, Err(EngineError::UnknownDrug(_))));
    }

    #[test]
    fn test_invalid_physiology_rejected() {
        let calc = calculator();
        assert!(matches!(
            calc.renal(&renal_request("DRUG_006", 40, 0.0, 1.0)),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            calc.renal(&renal_request("DRUG_006", 40, 70.0, -1.0)),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_geriatric_warning_not_multiplier() {
        // Digoxin, 70 y, 70 kg, SCr 0.8 -> CrCl 85 -> Mild (factor 0.75)
        let result = calculator().renal(&renal_request("DRUG_009", 70, 70.0, 0.8)).unwrap();
        assert_eq!(result.adjustment_factor, 0.75);
        assert_eq!(result.adjusted_dose, 750.0);
        assert!(result.warnings.iter().any(|w| w.contains("Geriatric")));

        let young = calculator().renal(&renal_request("DRUG_009", 40, 70.0, 0.7)).unwrap();
        assert!(young.warnings.is_empty());
    }

    #[test]
    fn test_hepatic_class_b() {
        let request = HepaticDoseRequest {
            drug_id: "DRUG_004".to_string(),
            standard_dose: 40.0,
            unit: "mg".to_string(),
            age: 55,
            panel: HepaticPanel {
                bilirubin: 2.5,
                albumin: 3.0,
                inr: 1.8,
                ascites: ClinicalGrade::Mild,
                encephalopathy: ClinicalGrade::None,
            },
        };
        let result = calculator().hepatic(&request).unwrap();
        assert_eq!(result.child_pugh_score, Some(9));
        assert_eq!(result.category, FunctionCategory::Hepatic(ChildPughClass::B));
        assert_eq!(result.adjusted_dose, 20.0);
        assert!(result.creatinine_clearance.is_none());
    }

    #[test]
    fn test_hepatic_unknown_drug() {
        let request = HepaticDoseRequest {
            drug_id: "DRUG_013".to_string(),
            standard_dose: 500.0,
            unit: "mg".to_string(),
            age: 30,
            panel: HepaticPanel {
                bilirubin: 1.0,
                albumin: 4.0,
                inr: 1.0,
                ascites: ClinicalGrade::None,
                encephalopathy: ClinicalGrade::None,
            },
        };
        assert!(matches!(calculator().hepatic(&request), Err(EngineError::UnknownDrug(_))));
    }

    #[test]
    fn test_table_rejects_bad_category_and_factor() {
        let bad_category = r#"{"renal": {"X": {"Terrible": {"factor": 0.5, "rationale": ""}}}}"#;
        assert!(matches!(DoseTables::from_json(bad_category), Err(EngineError::Config(_))));

        let bad_factor = r#"{"renal": {"X": {"Mild": {"factor": 1.5, "rationale": ""}}}}"#;
        assert!(matches!(DoseTables::from_json(bad_factor), Err(EngineError::Config(_))));
    }
}
