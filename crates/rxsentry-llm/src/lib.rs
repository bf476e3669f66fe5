//! RxSentry Narrative Provider Layer
//!
//! Pluggable clinical-narrative generators behind the [`NarrativeProvider`]
//! trait. A narrative is optional enrichment: callers treat any error or
//! timeout as "no narrative" and carry on.
//!
//! # Providers
//!
//! - `MockNarrativeProvider`: deterministic mock for testing
//! - `OllamaProvider`: local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use rxsentry_llm::{MockNarrativeProvider, NarrativeProvider, NarrativeRequest};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let provider = MockNarrativeProvider::new("No clinically relevant findings.");
//!     let narrative = provider.narrate(&NarrativeRequest::default()).await.unwrap();
//!     assert_eq!(narrative.analysis, "No clinically relevant findings.");
//! });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod prompt;

use async_trait::async_trait;
use rxsentry_domain::{Drug, InteractionFact, PatientProfile};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use config::NarrativeConfig;
pub use ollama::OllamaProvider;

/// Errors that can occur during narrative generation
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// One interaction as presented to the narrative generator
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeInteraction {
    /// First drug name
    pub drug_a: String,
    /// Second drug name
    pub drug_b: String,
    /// Upper-case severity name
    pub severity: String,
    /// Catalog description
    pub description: String,
}

/// Input to a narrative generator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeRequest {
    /// Display names of every checked drug
    pub drugs: Vec<String>,
    /// Detected interactions, most dangerous first
    pub interactions: Vec<NarrativeInteraction>,
    /// Short de-identified patient description, if a patient is known
    pub patient_summary: Option<String>,
}

impl NarrativeRequest {
    /// Build a request from domain values
    ///
    /// Drug names are resolved from `drugs`; an id missing there is shown
    /// as the raw id.
    pub fn from_check(
        drugs: &[Drug],
        facts: &[InteractionFact],
        patient: Option<&PatientProfile>,
    ) -> Self {
        let name_of = |id: &rxsentry_domain::DrugId| {
            drugs
                .iter()
                .find(|d| &d.id == id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        Self {
            drugs: drugs.iter().map(|d| d.name.clone()).collect(),
            interactions: facts
                .iter()
                .map(|f| NarrativeInteraction {
                    drug_a: name_of(f.pair.first()),
                    drug_b: name_of(f.pair.second()),
                    severity: f.severity.as_str().to_string(),
                    description: f.description.clone(),
                })
                .collect(),
            patient_summary: patient.map(summarize_patient),
        }
    }
}

fn summarize_patient(patient: &PatientProfile) -> String {
    let mut parts = vec![format!("{}-year-old {}", patient.age, patient.sex.as_str())];
    if patient.renal_impairment {
        parts.push("renal impairment".to_string());
    }
    if patient.hepatic_impairment {
        parts.push("hepatic impairment".to_string());
    }
    if patient.chronic_conditions > 0 {
        parts.push(format!("{} chronic conditions", patient.chronic_conditions));
    }
    if !patient.allergies.is_empty() {
        let allergens: Vec<&str> = patient.allergies.iter().map(|a| a.allergen.as_str()).collect();
        parts.push(format!("allergies: {}", allergens.join(", ")));
    }
    parts.join("; ")
}

/// Generated clinical narrative
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narrative {
    /// Free-text analysis
    pub analysis: String,
    /// Discrete recommendations extracted from the response
    pub recommendations: Vec<String>,
}

/// Asynchronous narrative generator
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Short provider name for logs and health output
    fn name(&self) -> &str;

    /// Generate a narrative for one check
    async fn narrate(&self, request: &NarrativeRequest) -> Result<Narrative, LlmError>;

    /// Check that the backend is reachable
    async fn health(&self) -> Result<(), LlmError>;
}

/// Mock narrative provider for deterministic testing
///
/// Clones share the call counter, so a clone handed to a pipeline can be
/// inspected from the test.
#[derive(Debug, Clone)]
pub struct MockNarrativeProvider {
    narrative: Narrative,
    delay: Option<Duration>,
    failing: Arc<AtomicBool>,
    call_count: Arc<AtomicUsize>,
}

impl MockNarrativeProvider {
    /// Create a mock that returns `analysis` with no recommendations
    pub fn new(analysis: impl Into<String>) -> Self {
        Self {
            narrative: Narrative {
                analysis: analysis.into(),
                recommendations: Vec::new(),
            },
            delay: None,
            failing: Arc::new(AtomicBool::new(false)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a recommendation to every returned narrative
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.narrative.recommendations.push(recommendation.into());
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Create a mock whose every call fails
    pub fn failing() -> Self {
        let provider = Self::default();
        provider.set_failing(true);
        provider
    }

    /// Toggle failure mode
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times narrate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MockNarrativeProvider {
    fn default() -> Self {
        Self::new("Default mock analysis")
    }
}

#[async_trait]
impl NarrativeProvider for MockNarrativeProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn narrate(&self, _request: &NarrativeRequest) -> Result<Narrative, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        Ok(self.narrative.clone())
    }

    async fn health(&self) -> Result<(), LlmError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Communication("Mock provider unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxsentry_domain::{Allergy, SeverityLevel, Sex};

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockNarrativeProvider::new("Test analysis").with_recommendation("Monitor INR");
        let narrative = provider.narrate(&NarrativeRequest::default()).await.unwrap();
        assert_eq!(narrative.analysis, "Test analysis");
        assert_eq!(narrative.recommendations, vec!["Monitor INR"]);
    }

    #[tokio::test]
    async fn test_mock_provider_call_count_shared_by_clones() {
        let provider1 = MockNarrativeProvider::default();
        let provider2 = provider1.clone();

        provider1.narrate(&NarrativeRequest::default()).await.unwrap();
        provider2.narrate(&NarrativeRequest::default()).await.unwrap();

        assert_eq!(provider1.call_count(), 2);
        provider2.reset_call_count();
        assert_eq!(provider1.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockNarrativeProvider::failing();
        let result = provider.narrate(&NarrativeRequest::default()).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
        assert!(provider.health().await.is_err());

        provider.set_failing(false);
        assert!(provider.health().await.is_ok());
    }

    #[test]
    fn test_request_from_check() {
        let drugs = vec![Drug::new("W", "Warfarin"), Drug::new("A", "Aspirin")];
        let facts = vec![InteractionFact::new("I1", "W", "A", SeverityLevel::Serious)
            .with_description("Bleeding risk")];
        let mut patient = PatientProfile::new("P1", 80, 60.0, Sex::Female);
        patient.renal_impairment = true;
        patient.allergies.push(Allergy::new("penicillin", "severe", "rash"));

        let request = NarrativeRequest::from_check(&drugs, &facts, Some(&patient));
        assert_eq!(request.drugs, vec!["Warfarin", "Aspirin"]);
        // Pair is canonical: "A" sorts before "W"
        assert_eq!(request.interactions[0].drug_a, "Aspirin");
        assert_eq!(request.interactions[0].severity, "SERIOUS");

        let summary = request.patient_summary.unwrap();
        assert!(summary.starts_with("80-year-old female"));
        assert!(summary.contains("renal impairment"));
        assert!(summary.contains("penicillin"));
    }
}
