//! Escalation decision

use rxsentry_domain::{AlertSet, EscalationDecision, RiskAssessment, RiskCategory, SeverityLevel, Urgency};

/// Decide whether the check result needs human review
///
/// Review is required for any CONTRAINDICATED interaction or a Critical risk
/// category. Urgency is IMMEDIATE for CONTRAINDICATED, URGENT for High or
/// Critical risk, ROUTINE otherwise.
pub fn decide(alerts: &AlertSet, risk: &RiskAssessment) -> EscalationDecision {
    let contraindicated = alerts.contains_severity(SeverityLevel::Contraindicated);

    let urgency = if contraindicated {
        Urgency::Immediate
    } else if matches!(risk.category, RiskCategory::Critical | RiskCategory::High) {
        Urgency::Urgent
    } else {
        Urgency::Routine
    };

    EscalationDecision {
        required: contraindicated || risk.category == RiskCategory::Critical,
        urgency,
        recommended_action: urgency.recommended_action().to_string(),
    }
}
