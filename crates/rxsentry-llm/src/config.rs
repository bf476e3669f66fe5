//! Configuration for narrative generation

use crate::{LlmError, MockNarrativeProvider, NarrativeProvider, OllamaProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which narrative backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeBackend {
    /// No narrative generation
    #[default]
    None,
    /// Deterministic mock
    Mock,
    /// Local Ollama instance
    Ollama,
}

/// Configuration for narrative generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Backend to use
    pub backend: NarrativeBackend,

    /// Ollama endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// HTTP timeout for a single request (seconds)
    pub request_timeout_secs: u64,

    /// Attempts before giving up
    pub max_retries: u32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            backend: NarrativeBackend::None,
            endpoint: crate::ollama::DEFAULT_ENDPOINT.to_string(),
            model: "llama3".to_string(),
            request_timeout_secs: crate::ollama::DEFAULT_TIMEOUT_SECS,
            max_retries: 1,
        }
    }
}

impl NarrativeConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == NarrativeBackend::Ollama {
            if self.endpoint.trim().is_empty() {
                return Err("narrative endpoint must not be empty".to_string());
            }
            if self.model.trim().is_empty() {
                return Err("narrative model must not be empty".to_string());
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Construct the configured provider, or `None` when disabled
    pub fn build(&self) -> Result<Option<Arc<dyn NarrativeProvider>>, LlmError> {
        self.validate().map_err(LlmError::Config)?;

        let provider: Arc<dyn NarrativeProvider> = match self.backend {
            NarrativeBackend::None => return Ok(None),
            NarrativeBackend::Mock => Arc::new(MockNarrativeProvider::default()),
            NarrativeBackend::Ollama => Arc::new(
                OllamaProvider::with_timeout(&self.endpoint, &self.model, self.request_timeout())?
                    .with_max_retries(self.max_retries),
            ),
        };
        Ok(Some(provider))
    }
}
