//! RxSentry Engine
//!
//! The interaction risk and alert pipeline: detection, confidence fusion,
//! risk scoring, smart alert filtering, escalation and dose adjustment.
//!
//! # Architecture
//!
//! ```text
//! CheckRequest → validate → detect ─┬─ verify (per pair, per source) ─┬→ risk → filter → escalate → CheckReport
//!                                   └─ narrate (own timeout) ─────────┘
//! ```
//!
//! The dose calculator is an independent entry point that shares only the
//! configuration.
//!
//! # Example Usage
//!
//! ```no_run
//! use rxsentry_engine::{CheckRequest, EngineConfig, Pipeline};
//! use rxsentry_store::InMemoryCatalog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(InMemoryCatalog::from_file("config/catalog.json")?);
//! let pipeline = Pipeline::new(catalog, EngineConfig::default())?;
//!
//! let request = CheckRequest::new(["DRUG_001", "DRUG_002", "DRUG_003"]).with_patient("PAT_001");
//! let report = pipeline.check(request).await?;
//!
//! println!("Risk: {:.1} ({})", report.risk.score, report.risk.category.as_str());
//! println!("Shown: {}, filtered: {}", report.alerts.total_shown(), report.alerts.total_filtered());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod detector;
mod dose;
mod scorer;
mod alerts;
mod escalation;
mod allergy;
mod report;
mod pipeline;


pub use error::EngineError;
pub use config::{AlertConfig, EngineConfig, ScoringStrategy};
pub use detector::{detect, validate_drug_ids, Detection};
pub use dose::{DoseCalculator, DoseTables, HepaticDoseRequest, RenalDoseRequest};
pub use scorer::{
    build_features, scorer_from_config, FallbackScorer, LogisticModel, RiskScorer, RuleBasedScorer,
    StatisticalScorer,
};
pub use alerts::{SmartAlertFilter, ALERT_POLYPHARMACY_THRESHOLD};
pub use escalation::decide;
pub use allergy::check_allergies;
pub use report::{
    interaction_risk_score, severity_summary, CheckReport, CheckRequest, ComponentHealth, HealthReport,
};
pub use pipeline::Pipeline;
