//! Configuration file parsing for the server.
//!
//! Loads the bind address, catalog location and the engine, verification
//! and narrative sections from one TOML file.

use rxsentry_engine::EngineConfig;
use rxsentry_llm::NarrativeConfig;
use rxsentry_verify::VerifyConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A section failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Catalog storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// Seed file loaded into memory
    #[default]
    Memory,
    /// Seed file imported into a SQLite database
    Sqlite,
}

/// Catalog location
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// JSON seed with drugs, interactions and patients
    pub seed_path: PathBuf,

    /// Storage backend
    #[serde(default)]
    pub backend: CatalogBackend,

    /// Database file for the SQLite backend (":memory:" when unset)
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Catalog location
    pub catalog: CatalogConfig,

    /// Pipeline settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// External verification sources
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Narrative provider
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.seed_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("catalog.seed_path".to_string()));
        }
        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("engine: {}", e)))?;
        self.verify
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("verify: {}", e)))?;
        self.narrative
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("narrative: {}", e)))?;
        Ok(())
    }

    /// Configuration for tests and local runs over the given seed file
    pub fn default_test_config(seed_path: impl Into<PathBuf>) -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            log_filter: default_log_filter(),
            catalog: CatalogConfig {
                seed_path: seed_path.into(),
                backend: CatalogBackend::Memory,
                sqlite_path: None,
            },
            engine: EngineConfig::default(),
            verify: VerifyConfig::default(),
            narrative: NarrativeConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxsentry_engine::ScoringStrategy;
    use rxsentry_llm::config::NarrativeBackend;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default_test_config("catalog.json");
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.catalog.backend, CatalogBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000

            [catalog]
            seed_path = "config/catalog.json"
            backend = "sqlite"
            sqlite_path = "rxsentry.db"

            [engine]
            max_drugs = 10
            scoring = "statistical"
            model_path = "models/risk.json"

            [engine.alerts]
            significant_limit = 4

            [verify]
            timeout_secs = 5

            [verify.rxnorm]
            enabled = true
            base_url = "https://rxnav.nlm.nih.gov"

            [narrative]
            backend = "mock"
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.catalog.backend, CatalogBackend::Sqlite);
        assert_eq!(config.engine.max_drugs, 10);
        assert_eq!(config.engine.scoring, ScoringStrategy::Statistical);
        assert_eq!(config.engine.alerts.significant_limit, 4);
        assert_eq!(config.engine.alerts.minor_limit, 3);
        assert_eq!(config.verify.timeout_secs, 5);
        assert!(config.verify.rxnorm.enabled);
        assert!(!config.verify.openfda.enabled);
        assert_eq!(config.narrative.backend, NarrativeBackend::Mock);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let missing_catalog = "bind_port = 9000";
        assert!(matches!(
            ServerConfig::from_toml(missing_catalog),
            Err(ConfigError::TomlParse(_))
        ));

        let bad_engine = r#"
            [catalog]
            seed_path = "catalog.json"

            [engine]
            max_drugs = 50
        "#;
        assert!(matches!(ServerConfig::from_toml(bad_engine), Err(ConfigError::Invalid(_))));

        let empty_seed = r#"
            [catalog]
            seed_path = ""
        "#;
        assert!(matches!(ServerConfig::from_toml(empty_seed), Err(ConfigError::MissingField(_))));
    }
}
