//! In-memory catalog loaded from a seed document

use crate::seed::CatalogSeed;
use crate::StoreError;
use rxsentry_domain::traits::DrugCatalog;
use rxsentry_domain::{Drug, DrugId, InteractionFact, PatientProfile};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Read-only catalog held entirely in memory
///
/// Interactions are keyed by the direction they were stored in, so
/// `find_interactions(a, b)` and `find_interactions(b, a)` return different
/// results unless the seed lists both.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    drugs: Vec<Drug>,
    drug_index: HashMap<DrugId, usize>,
    interactions: HashMap<(DrugId, DrugId), Vec<InteractionFact>>,
    patients: HashMap<String, PatientProfile>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a parsed seed, validating every record
    pub fn from_seed(seed: CatalogSeed) -> Result<Self, StoreError> {
        let mut catalog = Self::new();

        for record in seed.drugs {
            catalog.add_drug(Drug::try_from(record)?)?;
        }

        for record in seed.interactions {
            let a = DrugId::new(record.drug_a.as_str());
            let b = DrugId::new(record.drug_b.as_str());
            for id in [&a, &b] {
                if !catalog.drug_index.contains_key(id) {
                    return Err(StoreError::InvalidData(format!(
                        "Interaction {} references unknown drug {}",
                        record.interaction_id, id
                    )));
                }
            }
            let fact = InteractionFact::try_from(record)?;
            catalog.add_interaction_directed(a, b, fact);
        }

        for record in seed.patients {
            let patient = PatientProfile::try_from(record)?;
            if catalog.patients.contains_key(&patient.id) {
                return Err(StoreError::Duplicate(format!("patient {}", patient.id)));
            }
            catalog.patients.insert(patient.id.clone(), patient);
        }

        info!(
            drugs = catalog.drugs.len(),
            interactions = catalog.interaction_count(),
            patients = catalog.patients.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    /// Load a catalog from a JSON seed file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_seed(CatalogSeed::from_file(path)?)
    }

    /// Add a drug; fails if the id is already present
    pub fn add_drug(&mut self, drug: Drug) -> Result<(), StoreError> {
        if self.drug_index.contains_key(&drug.id) {
            return Err(StoreError::Duplicate(format!("drug {}", drug.id)));
        }
        self.drug_index.insert(drug.id.clone(), self.drugs.len());
        self.drugs.push(drug);
        Ok(())
    }

    /// Index a fact under its canonical pair direction
    pub fn add_interaction(&mut self, fact: InteractionFact) {
        let a = fact.pair.first().clone();
        let b = fact.pair.second().clone();
        self.add_interaction_directed(a, b, fact);
    }

    /// Index a fact under an explicit `(a, b)` direction only
    pub fn add_interaction_directed(&mut self, a: DrugId, b: DrugId, fact: InteractionFact) {
        self.interactions.entry((a, b)).or_default().push(fact);
    }

    /// Add a patient profile, replacing any existing one with the same id
    pub fn add_patient(&mut self, patient: PatientProfile) {
        self.patients.insert(patient.id.clone(), patient);
    }

    /// Number of stored interaction records
    pub fn interaction_count(&self) -> usize {
        self.interactions.values().map(Vec::len).sum()
    }
}

impl DrugCatalog for InMemoryCatalog {
    type Error = StoreError;

    fn get_drug(&self, id: &DrugId) -> Result<Option<Drug>, Self::Error> {
        Ok(self.drug_index.get(id).map(|&i| self.drugs[i].clone()))
    }

    fn find_interactions(&self, a: &DrugId, b: &DrugId) -> Result<Vec<InteractionFact>, Self::Error> {
        Ok(self
            .interactions
            .get(&(a.clone(), b.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn get_patient(&self, id: &str) -> Result<Option<PatientProfile>, Self::Error> {
        Ok(self.patients.get(id.trim()).cloned())
    }

    fn list_drugs(&self) -> Result<Vec<Drug>, Self::Error> {
        Ok(self.drugs.clone())
    }

    fn ping(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
