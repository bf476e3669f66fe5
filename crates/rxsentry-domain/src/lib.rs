//! RxSentry Domain Layer
//!
//! This crate contains the value objects, clinical formulas and trait
//! interfaces of the interaction risk pipeline. It has a single external
//! dependency (`uuid`) and no I/O; every other crate depends on it.
//!
//! ## Key Concepts
//!
//! - **Severity**: four totally ordered danger tiers with fixed weights
//! - **Interaction fact**: a symmetric statement about an unordered drug pair
//! - **Confidence**: fusion of local and external verdicts by a fixed rule list
//! - **Risk assessment**: a 0-100 score and category from twelve features
//! - **Dose adjustment**: Cockcroft-Gault and Child-Pugh classification
//!
//! ## Architecture
//!
//! - Pure business values only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external lookups

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod check;
pub mod confidence;
pub mod dose;
pub mod drug;
pub mod escalation;
pub mod interaction;
pub mod patient;
pub mod risk;
pub mod severity;
pub mod traits;

// Re-exports for convenience
pub use alert::{AlertSet, ScoredInteraction};
pub use check::{AllergyAlert, AllergyMatch, CheckId};
pub use confidence::{ConfidenceScore, ExternalVerdict, SourceAuthority, VerdictOutcome};
pub use dose::{ChildPughClass, DoseAdjustment, DoseAdjustmentResult, RenalCategory};
pub use drug::{Drug, DrugId};
pub use escalation::{EscalationDecision, Urgency};
pub use interaction::{DetectedInteraction, DrugPair, InteractionFact};
pub use patient::{Allergy, PatientProfile, Sex};
pub use risk::{RiskAssessment, RiskCategory, RiskFeatures};
pub use severity::SeverityLevel;
