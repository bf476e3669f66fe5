//! Organ-function classification and dose adjustment values
//!
//! Renal function is estimated with the Cockcroft-Gault creatinine clearance;
//! hepatic function is graded with the Child-Pugh score.

use crate::Sex;

/// Renal function category by creatinine clearance (mL/min)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenalCategory {
    /// CrCl >= 90
    Normal,
    /// 60 <= CrCl < 90
    Mild,
    /// 30 <= CrCl < 60
    Moderate,
    /// 15 <= CrCl < 30
    Severe,
    /// CrCl < 15 (end-stage renal disease)
    Esrd,
}

impl RenalCategory {
    /// Every category, best function first
    pub const ALL: [RenalCategory; 5] = [
        RenalCategory::Normal,
        RenalCategory::Mild,
        RenalCategory::Moderate,
        RenalCategory::Severe,
        RenalCategory::Esrd,
    ];

    /// Classify a creatinine clearance value
    pub fn from_crcl(crcl: f64) -> Self {
        if crcl >= 90.0 {
            RenalCategory::Normal
        } else if crcl >= 60.0 {
            RenalCategory::Mild
        } else if crcl >= 30.0 {
            RenalCategory::Moderate
        } else if crcl >= 15.0 {
            RenalCategory::Severe
        } else {
            RenalCategory::Esrd
        }
    }

    /// Display name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            RenalCategory::Normal => "Normal",
            RenalCategory::Mild => "Mild",
            RenalCategory::Moderate => "Moderate",
            RenalCategory::Severe => "Severe",
            RenalCategory::Esrd => "ESRD",
        }
    }

    /// Parse a category name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(RenalCategory::Normal),
            "mild" => Some(RenalCategory::Mild),
            "moderate" => Some(RenalCategory::Moderate),
            "severe" => Some(RenalCategory::Severe),
            "esrd" => Some(RenalCategory::Esrd),
            _ => None,
        }
    }
}

/// Child-Pugh hepatic function class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChildPughClass {
    /// Score 5-6, well-compensated
    A,
    /// Score 7-9, significant functional compromise
    B,
    /// Score 10-15, decompensated
    C,
}

impl ChildPughClass {
    /// Classify a Child-Pugh point total
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=6 => ChildPughClass::A,
            7..=9 => ChildPughClass::B,
            _ => ChildPughClass::C,
        }
    }

    /// Display name of the class
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildPughClass::A => "A",
            ChildPughClass::B => "B",
            ChildPughClass::C => "C",
        }
    }

    /// Parse "A", "b", "Child-Pugh C", ...
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        match s.trim_start_matches("CHILD-PUGH").trim() {
            "A" => Some(ChildPughClass::A),
            "B" => Some(ChildPughClass::B),
            "C" => Some(ChildPughClass::C),
            _ => None,
        }
    }
}

/// Clinical grade used by the Child-Pugh score (ascites, encephalopathy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClinicalGrade {
    /// Absent
    #[default]
    None,
    /// Mild (ascites) or grade 1-2 (encephalopathy)
    Mild,
    /// Moderate-severe (ascites) or grade 3-4 (encephalopathy)
    Severe,
}

impl ClinicalGrade {
    fn points(&self) -> u32 {
        match self {
            ClinicalGrade::None => 1,
            ClinicalGrade::Mild => 2,
            ClinicalGrade::Severe => 3,
        }
    }

    /// Parse "none", "mild", "moderate", "severe", "grade 1-2", ...
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "absent" => Some(ClinicalGrade::None),
            "mild" | "slight" | "grade 1-2" | "grade1-2" => Some(ClinicalGrade::Mild),
            "moderate" | "severe" | "moderate-severe" | "grade 3-4" | "grade3-4" => {
                Some(ClinicalGrade::Severe)
            }
            _ => None,
        }
    }
}

/// Laboratory values and clinical signs for the Child-Pugh score
#[derive(Debug, Clone, PartialEq)]
pub struct HepaticPanel {
    /// Total bilirubin (mg/dL)
    pub bilirubin: f64,
    /// Serum albumin (g/dL)
    pub albumin: f64,
    /// International normalized ratio
    pub inr: f64,
    /// Ascites grade
    pub ascites: ClinicalGrade,
    /// Hepatic encephalopathy grade
    pub encephalopathy: ClinicalGrade,
}

/// Cockcroft-Gault creatinine clearance in mL/min, never negative
///
/// `CrCl = ((140 - age) * weight) / (72 * SCr)`, times 0.85 for females.
pub fn cockcroft_gault(age: u32, weight_kg: f64, serum_creatinine: f64, sex: Sex) -> f64 {
    let base = ((140.0 - age as f64) * weight_kg) / (72.0 * serum_creatinine);
    let adjusted = match sex {
        Sex::Female => base * 0.85,
        Sex::Male => base,
    };
    adjusted.max(0.0)
}

/// Child-Pugh point total (5-15)
pub fn child_pugh_score(panel: &HepaticPanel) -> u32 {
    let bilirubin = if panel.bilirubin < 2.0 {
        1
    } else if panel.bilirubin <= 3.0 {
        2
    } else {
        3
    };

    let albumin = if panel.albumin > 3.5 {
        1
    } else if panel.albumin >= 2.8 {
        2
    } else {
        3
    };

    let inr = if panel.inr < 1.7 {
        1
    } else if panel.inr <= 2.3 {
        2
    } else {
        3
    };

    bilirubin + albumin + inr + panel.ascites.points() + panel.encephalopathy.points()
}

/// A per-drug, per-category adjustment record
#[derive(Debug, Clone, PartialEq)]
pub struct DoseAdjustment {
    /// Multiplicative factor in [0, 1]; exactly 0 means contraindicated
    pub factor: f64,

    /// Clinical rationale for the adjustment
    pub rationale: String,
}

impl DoseAdjustment {
    /// Create an adjustment, clamping the factor into [0, 1]
    pub fn new(factor: f64, rationale: impl Into<String>) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    /// Whether the drug must not be given in this category
    pub fn is_contraindicated(&self) -> bool {
        self.factor == 0.0
    }
}

/// Organ-function category a dose result was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCategory {
    /// Renal path
    Renal(RenalCategory),
    /// Hepatic path
    Hepatic(ChildPughClass),
}

impl FunctionCategory {
    /// Display label ("Moderate", "Child-Pugh B")
    pub fn label(&self) -> String {
        match self {
            FunctionCategory::Renal(c) => c.as_str().to_string(),
            FunctionCategory::Hepatic(c) => format!("Child-Pugh {}", c.as_str()),
        }
    }
}

/// Outcome of one dose-adjustment calculation
#[derive(Debug, Clone, PartialEq)]
pub struct DoseAdjustmentResult {
    /// Drug the dose applies to
    pub drug_id: String,
    /// Standard dose supplied by the caller
    pub original_dose: f64,
    /// Dose unit (e.g. "mg")
    pub unit: String,
    /// Factor applied, in [0, 1]
    pub adjustment_factor: f64,
    /// Resulting dose; 0 when contraindicated
    pub adjusted_dose: f64,
    /// Category used for the lookup
    pub category: FunctionCategory,
    /// Creatinine clearance (renal path only)
    pub creatinine_clearance: Option<f64>,
    /// Child-Pugh points (hepatic path only)
    pub child_pugh_score: Option<u32>,
    /// Why this dose was chosen
    pub rationale: String,
    /// Additional warnings (e.g. geriatric)
    pub warnings: Vec<String>,
    /// Drug must not be given in this category
    pub contraindicated: bool,
    /// Whether a record existed for the category
    pub adjustment_defined: bool,
    /// Monitoring and follow-up advice
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cockcroft_gault_reference_case() {
        let crcl = cockcroft_gault(75, 70.0, 1.8, Sex::Male);
        assert!((crcl - 35.1).abs() < 0.05, "got {}", crcl);
        assert_eq!(RenalCategory::from_crcl(crcl), RenalCategory::Moderate);
    }

    #[test]
    fn test_cockcroft_gault_female_factor() {
        let male = cockcroft_gault(60, 60.0, 1.0, Sex::Male);
        let female = cockcroft_gault(60, 60.0, 1.0, Sex::Female);
        assert!((female - male * 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_cockcroft_gault_never_negative() {
        assert_eq!(cockcroft_gault(150, 70.0, 1.0, Sex::Male), 0.0);
    }

    #[test]
    fn test_renal_boundaries() {
        assert_eq!(RenalCategory::from_crcl(90.0), RenalCategory::Normal);
        assert_eq!(RenalCategory::from_crcl(89.9), RenalCategory::Mild);
        assert_eq!(RenalCategory::from_crcl(60.0), RenalCategory::Mild);
        assert_eq!(RenalCategory::from_crcl(59.9), RenalCategory::Moderate);
        assert_eq!(RenalCategory::from_crcl(30.0), RenalCategory::Moderate);
        assert_eq!(RenalCategory::from_crcl(29.9), RenalCategory::Severe);
        assert_eq!(RenalCategory::from_crcl(15.0), RenalCategory::Severe);
        assert_eq!(RenalCategory::from_crcl(14.9), RenalCategory::Esrd);
    }

    #[test]
    fn test_child_pugh() {
        let healthy = HepaticPanel {
            bilirubin: 1.0,
            albumin: 4.0,
            inr: 1.0,
            ascites: ClinicalGrade::None,
            encephalopathy: ClinicalGrade::None,
        };
        assert_eq!(child_pugh_score(&healthy), 5);
        assert_eq!(ChildPughClass::from_score(5), ChildPughClass::A);

        let compromised = HepaticPanel {
            bilirubin: 2.5,
            albumin: 3.0,
            inr: 1.8,
            ascites: ClinicalGrade::Mild,
            encephalopathy: ClinicalGrade::None,
        };
        assert_eq!(child_pugh_score(&compromised), 9);
        assert_eq!(ChildPughClass::from_score(9), ChildPughClass::B);

        let decompensated = HepaticPanel {
            bilirubin: 4.0,
            albumin: 2.5,
            inr: 2.5,
            ascites: ClinicalGrade::Severe,
            encephalopathy: ClinicalGrade::Severe,
        };
        assert_eq!(child_pugh_score(&decompensated), 15);
        assert_eq!(ChildPughClass::from_score(15), ChildPughClass::C);
    }

    #[test]
    fn test_parsing() {
        assert_eq!(RenalCategory::parse("esrd"), Some(RenalCategory::Esrd));
        assert_eq!(ChildPughClass::parse("Child-Pugh b"), Some(ChildPughClass::B));
        assert_eq!(ClinicalGrade::parse("grade 3-4"), Some(ClinicalGrade::Severe));
    }

    #[test]
    fn test_zero_factor_is_contraindicated() {
        assert!(DoseAdjustment::new(0.0, "avoid").is_contraindicated());
        assert!(!DoseAdjustment::new(0.5, "halve").is_contraindicated());
    }
}
