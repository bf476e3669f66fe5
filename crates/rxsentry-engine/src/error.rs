//! Error types for the pipeline

use thiserror::Error;

/// Errors that can occur during a check or a dose calculation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed, duplicate or out-of-range input; rejected before any work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Drug absent from the relevant dose adjustment table
    #[error("Unknown drug: {0}")]
    UnknownDrug(String),

    /// A verification or narrative collaborator failed; reported as metadata only
    #[error("External source unavailable: {0}")]
    ExternalSourceUnavailable(String),

    /// Statistical risk model missing or unusable
    #[error("Statistical model unavailable: {0}")]
    StatisticalModelUnavailable(String),

    /// Catalog lookup failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::UnknownDrug(_) => "unknown_drug",
            EngineError::ExternalSourceUnavailable(_) => "external_source_unavailable",
            EngineError::StatisticalModelUnavailable(_) => "statistical_model_unavailable",
            EngineError::Catalog(_) => "catalog",
            EngineError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Config(format!("JSON parse error: {}", e))
    }
}
