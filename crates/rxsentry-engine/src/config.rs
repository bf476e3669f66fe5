//! Configuration for the pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Risk scoring strategy selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Deterministic weighted formula
    #[default]
    RuleBased,
    /// Logistic model loaded from `model_path`, falling back to rule-based
    Statistical,
}

/// Alert truncation policy
///
/// CONTRAINDICATED and SERIOUS buckets have no limit setting; they are never
/// truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Maximum SIGNIFICANT alerts shown
    pub significant_limit: usize,

    /// Maximum MINOR alerts shown
    pub minor_limit: usize,

    /// Therapeutic classes that raise alert priority
    pub high_risk_classes: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            significant_limit: 5,
            minor_limit: 3,
            high_risk_classes: vec![
                "anticoagulant".to_string(),
                "chemotherapeutic".to_string(),
                "immunosuppressant".to_string(),
            ],
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum drugs per check
    pub max_drugs: usize,

    /// Maximum time for the narrative call (seconds)
    pub narrative_timeout_secs: u64,

    /// Risk scoring strategy
    pub scoring: ScoringStrategy,

    /// Logistic model file for the statistical strategy
    pub model_path: Option<PathBuf>,

    /// Dose adjustment tables; the built-in table is used when unset
    pub dose_table_path: Option<PathBuf>,

    /// Alert truncation policy
    pub alerts: AlertConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_drugs: 20,
            narrative_timeout_secs: 10,
            scoring: ScoringStrategy::RuleBased,
            model_path: None,
            dose_table_path: None,
            alerts: AlertConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Strict preset: fewer low-severity alerts, short narrative budget
    pub fn strict() -> Self {
        Self {
            narrative_timeout_secs: 5,
            alerts: AlertConfig {
                significant_limit: 3,
                minor_limit: 1,
                ..AlertConfig::default()
            },
            ..Self::default()
        }
    }

    /// Verbose preset: more low-severity alerts, long narrative budget
    pub fn verbose() -> Self {
        Self {
            narrative_timeout_secs: 30,
            alerts: AlertConfig {
                significant_limit: 10,
                minor_limit: 10,
                ..AlertConfig::default()
            },
            ..Self::default()
        }
    }

    /// Get the narrative timeout as a Duration
    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_secs(self.narrative_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_drugs < 1 || self.max_drugs > 20 {
            return Err("max_drugs must be between 1 and 20".to_string());
        }
        if self.narrative_timeout_secs == 0 {
            return Err("narrative_timeout_secs must be greater than 0".to_string());
        }
        if self.scoring == ScoringStrategy::Statistical && self.model_path.is_none() {
            return Err("model_path is required for the statistical strategy".to_string());
        }
        if self.alerts.high_risk_classes.iter().any(|c| c.trim().is_empty()) {
            return Err("high_risk_classes must not contain empty names".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::strict().validate().is_ok());
        assert!(EngineConfig::verbose().validate().is_ok());
    }

    #[test]
    fn test_max_drugs_bounds() {
        let mut config = EngineConfig::default();
        config.max_drugs = 0;
        assert!(config.validate().is_err());
        config.max_drugs = 21;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_statistical_requires_model() {
        let mut config = EngineConfig::default();
        config.scoring = ScoringStrategy::Statistical;
        assert!(config.validate().is_err());
        config.model_path = Some(PathBuf::from("model.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::strict();
        let parsed = EngineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.alerts.significant_limit, 3);
        assert_eq!(parsed.narrative_timeout_secs, 5);
        assert_eq!(parsed.alerts.high_risk_classes.len(), 3);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml(
            r#"
            scoring = "statistical"
            model_path = "models/risk.json"

            [alerts]
            minor_limit = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.scoring, ScoringStrategy::Statistical);
        assert_eq!(config.alerts.minor_limit, 0);
        assert_eq!(config.alerts.significant_limit, 5);
        assert_eq!(config.max_drugs, 20);
    }
}
