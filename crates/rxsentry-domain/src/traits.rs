//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Implementations live in other crates.

use crate::{Drug, DrugId, InteractionFact, PatientProfile};

/// Read-only lookup of drugs, interactions and patients
///
/// Implemented by the catalog layer (rxsentry-store). A catalog may index an
/// interaction under one direction of the pair only, so callers must query
/// both orderings.
pub trait DrugCatalog {
    /// Error type for catalog operations
    type Error;

    /// Get a drug by ID
    fn get_drug(&self, id: &DrugId) -> Result<Option<Drug>, Self::Error>;

    /// Interaction facts recorded for the directed pair `(a, b)`
    fn find_interactions(&self, a: &DrugId, b: &DrugId) -> Result<Vec<InteractionFact>, Self::Error>;

    /// Get a patient profile by ID
    fn get_patient(&self, id: &str) -> Result<Option<PatientProfile>, Self::Error>;

    /// List every drug in the catalog
    fn list_drugs(&self) -> Result<Vec<Drug>, Self::Error>;

    /// Check that the catalog is reachable
    fn ping(&self) -> Result<(), Self::Error>;
}
