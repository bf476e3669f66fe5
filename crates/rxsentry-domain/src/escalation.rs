//! Escalation decision value objects

/// How quickly a human must review the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    /// Review now
    Immediate,
    /// Review within 24 hours
    Urgent,
    /// Normal workflow
    Routine,
}

impl Urgency {
    /// Get the urgency as an upper-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Immediate => "IMMEDIATE",
            Urgency::Urgent => "URGENT",
            Urgency::Routine => "ROUTINE",
        }
    }

    /// Fixed recommended action for this urgency
    pub fn recommended_action(&self) -> &'static str {
        match self {
            Urgency::Immediate => {
                "Contraindicated combination detected. Do not dispense; consult a clinical pharmacist immediately."
            }
            Urgency::Urgent => {
                "High-risk regimen. Clinical pharmacist review recommended within 24 hours."
            }
            Urgency::Routine => "No escalation needed. Continue routine monitoring.",
        }
    }
}

/// Whether the result requires human review, and how urgently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationDecision {
    /// Review required
    pub required: bool,

    /// Urgency of the review
    pub urgency: Urgency,

    /// Action text for the reviewer
    pub recommended_action: String,
}
