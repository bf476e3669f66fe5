//! RxSentry Catalog Layer
//!
//! Implements the `DrugCatalog` trait over two backends:
//!
//! - [`InMemoryCatalog`]: loaded once from a JSON seed file, used by the
//!   server and by tests
//! - [`SqliteCatalog`]: SQLite tables populated from the same seed format
//!
//! # Architecture
//!
//! - Read-only at check time; all writes happen during seeding
//! - Interactions are indexed in the stored direction only, so the detector
//!   queries both orderings of each pair
//!
//! # Examples
//!
//! ```no_run
//! use rxsentry_store::InMemoryCatalog;
//!
//! let catalog = InMemoryCatalog::from_file("config/catalog.json").unwrap();
//! // Catalog is now ready for lookups
//! ```

#![warn(missing_docs)]

pub mod memory;
pub mod seed;
pub mod sqlite;

pub use memory::InMemoryCatalog;
pub use seed::CatalogSeed;
pub use sqlite::SqliteCatalog;

use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Seed file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid JSON
    #[error("Seed parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Record defined twice
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Internal lock poisoned by a panicking thread
    #[error("Catalog lock poisoned")]
    LockPoisoned,
}
