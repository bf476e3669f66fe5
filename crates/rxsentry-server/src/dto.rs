//! JSON request and response bodies, and their conversions to and from
//! engine types.
//!
//! The domain crate carries no serde derives; this module owns the wire
//! shape of every endpoint.

use rxsentry_domain::dose::{ClinicalGrade, HepaticPanel};
use rxsentry_domain::{AllergyAlert, Drug, DoseAdjustmentResult, ScoredInteraction, SeverityLevel, Sex};
use rxsentry_engine::{CheckReport, CheckRequest, EngineError, HealthReport, HepaticDoseRequest, RenalDoseRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_dose_unit() -> String {
    "mg".to_string()
}

/// Round to `places` decimal places for display
fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// POST /check request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInteractionsRequest {
    pub drug_ids: Vec<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default, alias = "check_allergies")]
    pub include_allergy_check: bool,
    #[serde(default)]
    pub include_llm_analysis: bool,
}

impl From<CheckInteractionsRequest> for CheckRequest {
    fn from(req: CheckInteractionsRequest) -> Self {
        CheckRequest {
            drug_ids: req.drug_ids,
            patient_id: req.patient_id,
            include_allergy_check: req.include_allergy_check,
            include_narrative: req.include_llm_analysis,
        }
    }
}

/// One displayed alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionAlert {
    pub interaction_id: String,
    pub drug_a: String,
    pub drug_b: String,
    pub severity_level: String,
    pub description: String,
    pub clinical_effects: String,
    pub management_recommendations: String,
    pub priority_score: f64,
    pub confidence: f64,
    pub confirmed_by: Vec<String>,
}

impl From<&ScoredInteraction> for InteractionAlert {
    fn from(alert: &ScoredInteraction) -> Self {
        InteractionAlert {
            interaction_id: alert.fact.id.clone(),
            drug_a: alert.fact.pair.first().to_string(),
            drug_b: alert.fact.pair.second().to_string(),
            severity_level: alert.severity().as_str().to_string(),
            description: alert.fact.description.clone(),
            clinical_effects: alert.fact.clinical_effects.clone(),
            management_recommendations: alert.fact.management.clone(),
            priority_score: round_to(alert.priority, 2),
            confidence: round_to(alert.confidence.value(), 2),
            confirmed_by: alert.confirmed_by.clone(),
        }
    }
}

/// Counts behind the alert filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartAlertInfo {
    pub total_interactions: usize,
    pub alerts_shown: usize,
    pub alerts_filtered: usize,
    pub filtering_reason: Option<String>,
}

/// Escalation decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationInfo {
    pub required: bool,
    pub urgency: String,
    pub recommended_action: String,
}

/// Narrative analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAnalysis {
    pub analysis: String,
    pub recommendations: Vec<String>,
}

/// A checked drug conflicting with a recorded allergy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyAlertInfo {
    pub allergen_name: String,
    pub matched_drug_id: String,
    pub matched_drug_name: String,
    pub match_type: String,
    pub severity: String,
    pub reaction_description: String,
    pub recommendation: String,
}

impl From<&AllergyAlert> for AllergyAlertInfo {
    fn from(alert: &AllergyAlert) -> Self {
        AllergyAlertInfo {
            allergen_name: alert.allergen.clone(),
            matched_drug_id: alert.drug_id.clone(),
            matched_drug_name: alert.drug_name.clone(),
            match_type: alert.match_kind.as_str().to_string(),
            severity: alert.severity.clone(),
            reaction_description: alert.reaction.clone(),
            recommendation: alert.recommendation.clone(),
        }
    }
}

/// POST /check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInteractionsResponse {
    pub check_id: String,
    pub checked_at: u64,
    pub drugs_checked: Vec<String>,
    pub interactions_found: Vec<InteractionAlert>,
    pub severity_summary: BTreeMap<String, usize>,
    pub risk_score: f64,
    pub ml_risk_score: f64,
    pub ml_risk_category: String,
    pub ml_contributing_factors: Vec<String>,
    pub ml_fallback_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_analysis: Option<LlmAnalysis>,
    pub alerts_shown: usize,
    pub alerts_filtered: usize,
    pub smart_alert_info: SmartAlertInfo,
    pub escalation: EscalationInfo,
    pub recommendations: Vec<String>,
    pub allergy_alerts: Vec<AllergyAlertInfo>,
    pub external_sources_checked: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<CheckReport> for CheckInteractionsResponse {
    fn from(report: CheckReport) -> Self {
        // Every level is present, including zero counts
        let severity_summary = SeverityLevel::ALL
            .iter()
            .map(|level| {
                let count = report.severity_summary.get(level).copied().unwrap_or(0);
                (level.as_str().to_string(), count)
            })
            .collect();

        let alerts_shown = report.alerts.total_shown();
        let alerts_filtered = report.alerts.total_filtered();

        CheckInteractionsResponse {
            check_id: report.check_id.to_string(),
            checked_at: report.checked_at,
            drugs_checked: report.drugs.iter().map(|d| d.id.to_string()).collect(),
            interactions_found: report.alerts.alerts.iter().map(InteractionAlert::from).collect(),
            severity_summary,
            risk_score: round_to(report.interaction_risk_score, 1),
            ml_risk_score: round_to(report.risk.score, 1),
            ml_risk_category: report.risk.category.as_str().to_string(),
            ml_contributing_factors: report.risk.contributing_factors,
            ml_fallback_used: report.risk.fallback_used,
            llm_analysis: report.narrative.map(|n| LlmAnalysis {
                analysis: n.analysis,
                recommendations: n.recommendations,
            }),
            alerts_shown,
            alerts_filtered,
            smart_alert_info: SmartAlertInfo {
                total_interactions: report.alerts.total(),
                alerts_shown,
                alerts_filtered,
                filtering_reason: report.alerts.filtering_reason,
            },
            escalation: EscalationInfo {
                required: report.escalation.required,
                urgency: report.escalation.urgency.as_str().to_string(),
                recommended_action: report.escalation.recommended_action,
            },
            recommendations: report.recommendations,
            allergy_alerts: report.allergy_alerts.iter().map(AllergyAlertInfo::from).collect(),
            external_sources_checked: report.external_sources_checked,
            warnings: report.warnings,
        }
    }
}

/// POST /dose-adjustment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseAdjustmentRequest {
    pub drug_id: String,
    pub standard_dose: f64,
    #[serde(default = "default_dose_unit")]
    pub dose_unit: String,
    pub age: u32,
    pub weight_kg: f64,
    pub serum_creatinine: f64,
    pub sex: String,
}

impl TryFrom<DoseAdjustmentRequest> for RenalDoseRequest {
    type Error = EngineError;

    fn try_from(req: DoseAdjustmentRequest) -> Result<Self, Self::Error> {
        let sex = Sex::parse(&req.sex)
            .ok_or_else(|| EngineError::InvalidInput(format!("Invalid sex: {}", req.sex)))?;
        Ok(RenalDoseRequest {
            drug_id: req.drug_id,
            standard_dose: req.standard_dose,
            unit: req.dose_unit,
            age: req.age,
            weight_kg: req.weight_kg,
            serum_creatinine: req.serum_creatinine,
            sex,
        })
    }
}

/// POST /dose-adjustment/hepatic request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HepaticAdjustmentRequest {
    pub drug_id: String,
    pub standard_dose: f64,
    #[serde(default = "default_dose_unit")]
    pub dose_unit: String,
    pub age: u32,
    pub bilirubin: f64,
    pub albumin: f64,
    pub inr: f64,
    #[serde(default)]
    pub ascites: String,
    #[serde(default)]
    pub encephalopathy: String,
}

fn parse_grade(field: &str, value: &str) -> Result<ClinicalGrade, EngineError> {
    ClinicalGrade::parse(value)
        .ok_or_else(|| EngineError::InvalidInput(format!("Invalid {} grade: {}", field, value)))
}

impl TryFrom<HepaticAdjustmentRequest> for HepaticDoseRequest {
    type Error = EngineError;

    fn try_from(req: HepaticAdjustmentRequest) -> Result<Self, Self::Error> {
        let panel = HepaticPanel {
            bilirubin: req.bilirubin,
            albumin: req.albumin,
            inr: req.inr,
            ascites: parse_grade("ascites", &req.ascites)?,
            encephalopathy: parse_grade("encephalopathy", &req.encephalopathy)?,
        };
        Ok(HepaticDoseRequest {
            drug_id: req.drug_id,
            standard_dose: req.standard_dose,
            unit: req.dose_unit,
            age: req.age,
            panel,
        })
    }
}

/// Dose adjustment response (both paths)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseAdjustmentResponse {
    pub drug_id: String,
    pub original_dose: f64,
    pub adjusted_dose: f64,
    pub dose_unit: String,
    pub adjustment_factor: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatinine_clearance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_pugh_score: Option<u32>,
    pub rationale: String,
    pub contraindicated: bool,
    pub adjustment_defined: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl From<DoseAdjustmentResult> for DoseAdjustmentResponse {
    fn from(result: DoseAdjustmentResult) -> Self {
        DoseAdjustmentResponse {
            category: result.category.label(),
            drug_id: result.drug_id,
            original_dose: result.original_dose,
            adjusted_dose: round_to(result.adjusted_dose, 2),
            dose_unit: result.unit,
            adjustment_factor: result.adjustment_factor,
            creatinine_clearance: result.creatinine_clearance.map(|c| round_to(c, 1)),
            child_pugh_score: result.child_pugh_score,
            rationale: result.rationale,
            contraindicated: result.contraindicated,
            adjustment_defined: result.adjustment_defined,
            warnings: result.warnings,
            recommendations: result.recommendations,
        }
    }
}

/// Catalog drug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugInfo {
    pub drug_id: String,
    pub drug_name: String,
    pub generic_name: String,
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxcui: Option<String>,
}

impl From<Drug> for DrugInfo {
    fn from(drug: Drug) -> Self {
        DrugInfo {
            drug_id: drug.id.to_string(),
            drug_name: drug.name,
            generic_name: drug.generic_name,
            classes: drug.classes,
            rxcui: drug.rxcui,
        }
    }
}

/// GET /drugs response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugListResponse {
    pub count: usize,
    pub drugs: Vec<DrugInfo>,
}

/// Health of one collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub catalog: ComponentStatus,
    pub narrative: ComponentStatus,
    pub verification_sources: Vec<String>,
    pub scoring_strategy: String,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        let status = |c: &rxsentry_engine::ComponentHealth| ComponentStatus {
            status: c.as_str().to_string(),
            detail: c.detail().map(str::to_string),
        };
        HealthResponse {
            status: if report.is_healthy() { "healthy" } else { "degraded" }.to_string(),
            catalog: status(&report.catalog),
            narrative: status(&report.narrative),
            verification_sources: report.verification_sources,
            scoring_strategy: report.scoring_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_accepts_legacy_allergy_flag() {
        let req: CheckInteractionsRequest =
            serde_json::from_str(r#"{"drug_ids": ["DRUG_001"], "check_allergies": true}"#).unwrap();
        assert!(req.include_allergy_check);
        assert!(!req.include_llm_analysis);

        let request = CheckRequest::from(req);
        assert!(request.include_allergy_check);
        assert_eq!(request.patient_id, None);
    }

    #[test]
    fn test_dose_request_conversion() {
        let req: DoseAdjustmentRequest = serde_json::from_str(
            r#"{"drug_id": "DRUG_006", "standard_dose": 1000, "age": 75,
                "weight_kg": 70, "serum_creatinine": 1.8, "sex": "M"}"#,
        )
        .unwrap();
        assert_eq!(req.dose_unit, "mg");

        let renal = RenalDoseRequest::try_from(req.clone()).unwrap();
        assert_eq!(renal.sex, Sex::Male);

        let bad = DoseAdjustmentRequest { sex: "unknown".to_string(), ..req };
        assert!(matches!(RenalDoseRequest::try_from(bad), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_hepatic_grades() {
        let req = HepaticAdjustmentRequest {
            drug_id: "DRUG_004".to_string(),
            standard_dose: 100.0,
            dose_unit: "mg".to_string(),
            age: 50,
            bilirubin: 2.5,
            albumin: 3.0,
            inr: 1.9,
            ascites: "mild".to_string(),
            encephalopathy: String::new(),
        };
        let hepatic = HepaticDoseRequest::try_from(req.clone()).unwrap();
        assert_eq!(hepatic.panel.ascites, ClinicalGrade::Mild);
        assert_eq!(hepatic.panel.encephalopathy, ClinicalGrade::None);

        let bad = HepaticAdjustmentRequest { ascites: "lots".to_string(), ..req };
        assert!(matches!(HepaticDoseRequest::try_from(bad), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(35.0694, 1), 35.1);
        assert_eq!(round_to(0.8512, 2), 0.85);
    }
}
