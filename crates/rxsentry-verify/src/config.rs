//! Configuration for external verification
//!
//! Defines per-source settings, the per-call timeout and the verdict cache
//! lifetime.

use crate::openfda::OpenFdaProvider;
use crate::rxnorm::RxNormProvider;
use crate::{VerdictProvider, VerifyError};
use rxsentry_domain::confidence::{ConfidenceConfig, DEFAULT_STRENGTH_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Settings for one HTTP verification source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Whether the source is queried at all
    pub enabled: bool,

    /// Base URL of the API
    pub base_url: String,

    /// Optional API key (openFDA raises rate limits with one)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Configuration for the confidence aggregator
///
/// # Examples
///
/// ```
/// use rxsentry_verify::VerifyConfig;
///
/// let config = VerifyConfig::default();
/// assert_eq!(config.timeout_secs, 10);
/// assert_eq!(config.cache_ttl_hours, 24);
///
/// let config = VerifyConfig::aggressive();
/// assert_eq!(config.timeout_secs, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Maximum time for one source call (seconds)
    pub timeout_secs: u64,

    /// How long a successful verdict stays cached (hours)
    pub cache_ttl_hours: u64,

    /// Maximum cached verdicts
    pub cache_capacity: u64,

    /// Report-count threshold separating strong from weak low-authority matches
    pub strength_threshold: f64,

    /// RxNorm interaction API
    pub rxnorm: SourceConfig,

    /// openFDA adverse event API
    pub openfda: SourceConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            cache_ttl_hours: 24,
            cache_capacity: 10_000,
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
            rxnorm: SourceConfig {
                enabled: false,
                base_url: crate::rxnorm::DEFAULT_BASE_URL.to_string(),
                api_key: None,
            },
            openfda: SourceConfig {
                enabled: false,
                base_url: crate::openfda::DEFAULT_BASE_URL.to_string(),
                api_key: None,
            },
        }
    }
}

impl VerifyConfig {
    /// Aggressive preset: short timeouts, short-lived cache
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 5,
            cache_ttl_hours: 6,
            ..Self::default()
        }
    }

    /// Lenient preset: long timeouts, long-lived cache
    pub fn lenient() -> Self {
        Self {
            timeout_secs: 30,
            cache_ttl_hours: 72,
            ..Self::default()
        }
    }

    /// Get the per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the cache time-to-live as a Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 3600)
    }

    /// Confidence rule parameters
    pub fn confidence(&self) -> ConfidenceConfig {
        ConfidenceConfig {
            strength_threshold: self.strength_threshold,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.cache_ttl_hours == 0 {
            return Err("cache_ttl_hours must be greater than 0".to_string());
        }
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }
        if !self.strength_threshold.is_finite() || self.strength_threshold < 0.0 {
            return Err("strength_threshold must be a non-negative number".to_string());
        }
        for (name, source) in [("rxnorm", &self.rxnorm), ("openfda", &self.openfda)] {
            if source.enabled && source.base_url.trim().is_empty() {
                return Err(format!("{}.base_url must not be empty", name));
            }
        }
        Ok(())
    }

    /// Construct the enabled HTTP providers, high authority first
    pub fn build_providers(&self) -> Result<Vec<Arc<dyn VerdictProvider>>, VerifyError> {
        self.validate().map_err(VerifyError::Config)?;

        let mut providers: Vec<Arc<dyn VerdictProvider>> = Vec::new();
        if self.rxnorm.enabled {
            providers.push(Arc::new(RxNormProvider::new(&self.rxnorm.base_url, self.timeout())?));
        }
        if self.openfda.enabled {
            providers.push(Arc::new(OpenFdaProvider::new(
                &self.openfda.base_url,
                self.openfda.api_key.clone(),
                self.timeout(),
            )?));
        }
        Ok(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(VerifyConfig::default().validate().is_ok());
        assert!(VerifyConfig::aggressive().validate().is_ok());
        assert!(VerifyConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = VerifyConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.confidence().strength_threshold, 100.0);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = VerifyConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = VerifyConfig::default();
        config.strength_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = VerifyConfig::default();
        config.openfda.enabled = true;
        config.openfda.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_providers_by_default() {
        assert!(VerifyConfig::default().build_providers().unwrap().is_empty());
    }

    #[test]
    fn test_build_enabled_providers_in_order() {
        let mut config = VerifyConfig::default();
        config.rxnorm.enabled = true;
        config.openfda.enabled = true;
        let providers = config.build_providers().unwrap();
        let ids: Vec<&str> = providers.iter().map(|p| p.source_id()).collect();
        assert_eq!(ids, vec!["rxnorm", "openfda"]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: VerifyConfig = toml::from_str(
            r#"
            timeout_secs = 3

            [openfda]
            enabled = true
            base_url = "https://api.fda.gov"
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.cache_ttl_hours, 24);
        assert!(config.openfda.enabled);
        assert_eq!(config.openfda.api_key.as_deref(), Some("abc"));
        assert!(!config.rxnorm.enabled);
    }
}
