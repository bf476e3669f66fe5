//! Error types for external verification

use thiserror::Error;

/// Errors that can occur while querying a verification source
///
/// None of these fail a check; the aggregator records the source as
/// unavailable and moves on.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Network or HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Drug lacks the identifier a source needs (e.g. RXCUI)
    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),

    /// Source did not answer in time
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for VerifyError {
    fn from(e: reqwest::Error) -> Self {
        VerifyError::Http(e.to_string())
    }
}
