//! RxSentry Server
//!
//! HTTP surface of the interaction risk and alert pipeline.
//!
//! # Endpoints
//!
//! - `POST /check`: interaction check with risk, alerts and escalation
//! - `POST /dose-adjustment`: renal dose adjustment (Cockcroft-Gault)
//! - `POST /dose-adjustment/hepatic`: hepatic dose adjustment (Child-Pugh)
//! - `GET /drugs`: catalog listing
//! - `GET /health`: catalog and narrative reachability

#![warn(missing_docs)]

pub mod config;
#[allow(missing_docs)]
pub mod dto;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod handlers;

use config::{CatalogBackend, ServerConfig};
use handlers::{create_router, AppState};
use rxsentry_domain::traits::DrugCatalog;
use rxsentry_engine::{EngineError, Pipeline};
use rxsentry_store::{CatalogSeed, InMemoryCatalog, SqliteCatalog, StoreError};
use rxsentry_verify::ConfidenceAggregator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Catalog behind the service, whichever backend was configured
pub type SharedCatalog = dyn DrugCatalog<Error = StoreError> + Send + Sync;

/// Pipeline type served over HTTP
pub type ServicePipeline = Pipeline<SharedCatalog>;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Catalog could not be loaded
    #[error("Catalog error: {0}")]
    Store(#[from] StoreError),

    /// Pipeline could not be constructed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Verification or narrative provider could not be constructed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

fn open_catalog(config: &ServerConfig) -> Result<Arc<SharedCatalog>, ServerError> {
    let catalog = &config.catalog;
    let shared: Arc<SharedCatalog> = match catalog.backend {
        CatalogBackend::Memory => {
            let memory = InMemoryCatalog::from_file(&catalog.seed_path)?;
            info!(interactions = memory.interaction_count(), "Loaded in-memory catalog");
            Arc::new(memory)
        }
        CatalogBackend::Sqlite => match &catalog.sqlite_path {
            // An existing database is served as-is
            Some(path) if path.exists() => {
                info!("Opening SQLite catalog at {}", path.display());
                Arc::new(SqliteCatalog::new(path)?)
            }
            Some(path) => {
                info!("Creating SQLite catalog at {}", path.display());
                let seed = CatalogSeed::from_file(&catalog.seed_path)?;
                Arc::new(SqliteCatalog::from_seed(path, seed)?)
            }
            None => {
                let seed = CatalogSeed::from_file(&catalog.seed_path)?;
                Arc::new(SqliteCatalog::from_seed(":memory:", seed)?)
            }
        },
    };
    Ok(shared)
}

/// Build the shared application state from configuration
///
/// Loads the catalog, constructs the enabled verification sources and the
/// narrative provider, and wires them into one pipeline.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    config.validate()?;

    let catalog = open_catalog(config)?;

    let providers = config
        .verify
        .build_providers()
        .map_err(|e| ServerError::Provider(e.to_string()))?;
    let aggregator = ConfidenceAggregator::new(providers, &config.verify);

    let mut pipeline = Pipeline::new(catalog, config.engine.clone())?.with_aggregator(aggregator);

    let narrative = config
        .narrative
        .build()
        .map_err(|e| ServerError::Provider(e.to_string()))?;
    if let Some(provider) = narrative {
        info!("Narrative provider: {}", provider.name());
        pipeline = pipeline.with_narrative(provider);
    }

    Ok(AppState {
        pipeline: Arc::new(pipeline),
    })
}

/// Start the HTTP server
///
/// Initializes tracing, builds the pipeline and serves until the process
/// stops.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    // Ignore a subscriber installed by an embedding process
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    info!("Starting RxSentry server");
    info!("Bind address: {}", config.bind_addr());
    info!("Catalog seed: {}", config.catalog.seed_path.display());
    info!("Scoring strategy: {:?}", config.engine.scoring);

    let state = build_state(&config)?;
    info!(
        "Verification sources: {:?}",
        state.pipeline.aggregator().source_ids()
    );

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("RxSentry listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
