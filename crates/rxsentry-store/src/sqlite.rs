//! SQLite-backed catalog
//!
//! Rows are read back through the seed record types, so the same validation
//! applies to both backends.

use crate::seed::{AllergyRecord, CatalogSeed, DrugRecord, InteractionRecord, PatientRecord};
use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use rxsentry_domain::traits::DrugCatalog;
use rxsentry_domain::{Drug, DrugId, InteractionFact, PatientProfile};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite implementation of `DrugCatalog`
///
/// # Thread Safety
///
/// The connection sits behind a mutex; lookups are short and never held
/// across an await point.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) a catalog database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a database and import a seed into it
    pub fn from_seed<P: AsRef<Path>>(path: P, seed: CatalogSeed) -> Result<Self, StoreError> {
        let catalog = Self::new(path)?;
        catalog.import_seed(seed)?;
        Ok(catalog)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Import every record of a seed in one transaction
    ///
    /// Records are validated before anything is written; an invalid record
    /// leaves the database untouched.
    pub fn import_seed(&self, seed: CatalogSeed) -> Result<(), StoreError> {
        for drug in &seed.drugs {
            Drug::try_from(drug.clone())?;
        }
        for interaction in &seed.interactions {
            InteractionFact::try_from(interaction.clone())?;
        }
        for patient in &seed.patients {
            PatientProfile::try_from(patient.clone())?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for drug in &seed.drugs {
            let generic = drug.generic_name.clone().unwrap_or_else(|| drug.drug_name.clone());
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO drugs (drug_id, drug_name, generic_name, rxcui)
                 VALUES (?1, ?2, ?3, ?4)",
                params![drug.drug_id.trim(), drug.drug_name, generic, drug.rxcui],
            )?;
            if inserted == 0 {
                return Err(StoreError::Duplicate(format!("drug {}", drug.drug_id)));
            }
            for (position, class) in drug.classes.iter().enumerate() {
                tx.execute(
                    "INSERT OR IGNORE INTO drug_classes (drug_id, class_name, position)
                     VALUES (?1, ?2, ?3)",
                    params![drug.drug_id.trim(), class, position as i64],
                )?;
            }
        }

        let mut seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM interactions",
            [],
            |row| row.get(0),
        )?;
        for interaction in &seed.interactions {
            tx.execute(
                "INSERT INTO interactions (interaction_id, drug_a, drug_b, severity_level,
                     description, clinical_effects, management_recommendations,
                     documented_adverse_outcomes, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    interaction.interaction_id,
                    interaction.drug_a.trim(),
                    interaction.drug_b.trim(),
                    interaction.severity_level,
                    interaction.description,
                    interaction.clinical_effects,
                    interaction.management_recommendations,
                    interaction.documented_adverse_outcomes,
                    seq,
                ],
            )?;
            seq += 1;
        }

        for patient in &seed.patients {
            tx.execute(
                "INSERT INTO patients (patient_id, age, weight_kg, sex, serum_creatinine,
                     renal_impairment, hepatic_impairment, chronic_conditions, current_drug_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    patient.patient_id,
                    patient.age,
                    patient.weight_kg,
                    patient.sex,
                    patient.serum_creatinine,
                    patient.renal_impairment,
                    patient.hepatic_impairment,
                    patient.chronic_conditions,
                    patient.current_drug_count,
                ],
            )?;
            for (position, allergy) in patient.allergies.iter().enumerate() {
                tx.execute(
                    "INSERT INTO allergies (patient_id, allergen, severity, reaction, position)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        patient.patient_id,
                        allergy.allergen,
                        allergy.severity,
                        allergy.reaction,
                        position as i64,
                    ],
                )?;
            }
        }

        tx.commit()?;
        info!(
            drugs = seed.drugs.len(),
            interactions = seed.interactions.len(),
            patients = seed.patients.len(),
            "Seed imported into SQLite catalog"
        );
        Ok(())
    }

    fn load_classes(conn: &Connection, drug_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT class_name FROM drug_classes WHERE drug_id = ?1 ORDER BY position",
        )?;
        let classes = stmt
            .query_map(params![drug_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(classes)
    }

    fn drug_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DrugRecord> {
        Ok(DrugRecord {
            drug_id: row.get(0)?,
            drug_name: row.get(1)?,
            generic_name: row.get(2)?,
            rxcui: row.get(3)?,
            classes: Vec::new(),
        })
    }
}

impl DrugCatalog for SqliteCatalog {
    type Error = StoreError;

    fn get_drug(&self, id: &DrugId) -> Result<Option<Drug>, Self::Error> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT drug_id, drug_name, generic_name, rxcui FROM drugs WHERE drug_id = ?1",
                params![id.as_str()],
                Self::drug_from_row,
            )
            .optional()?;

        match record {
            Some(mut record) => {
                record.classes = Self::load_classes(&conn, &record.drug_id)?;
                Ok(Some(Drug::try_from(record)?))
            }
            None => Ok(None),
        }
    }

    fn find_interactions(&self, a: &DrugId, b: &DrugId) -> Result<Vec<InteractionFact>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT interaction_id, drug_a, drug_b, severity_level, description,
                    clinical_effects, management_recommendations, documented_adverse_outcomes
             FROM interactions WHERE drug_a = ?1 AND drug_b = ?2 ORDER BY seq",
        )?;
        let records = stmt
            .query_map(params![a.as_str(), b.as_str()], |row| {
                Ok(InteractionRecord {
                    interaction_id: row.get(0)?,
                    drug_a: row.get(1)?,
                    drug_b: row.get(2)?,
                    severity_level: row.get(3)?,
                    description: row.get(4)?,
                    clinical_effects: row.get(5)?,
                    management_recommendations: row.get(6)?,
                    documented_adverse_outcomes: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(drug_a = %a, drug_b = %b, found = records.len(), "Interaction lookup");
        records.into_iter().map(InteractionFact::try_from).collect()
    }

    fn get_patient(&self, id: &str) -> Result<Option<PatientProfile>, Self::Error> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT patient_id, age, weight_kg, sex, serum_creatinine, renal_impairment,
                        hepatic_impairment, chronic_conditions, current_drug_count
                 FROM patients WHERE patient_id = ?1",
                params![id.trim()],
                |row| {
                    Ok(PatientRecord {
                        patient_id: row.get(0)?,
                        age: row.get(1)?,
                        weight_kg: row.get(2)?,
                        sex: row.get(3)?,
                        serum_creatinine: row.get(4)?,
                        renal_impairment: row.get(5)?,
                        hepatic_impairment: row.get(6)?,
                        chronic_conditions: row.get(7)?,
                        current_drug_count: row.get(8)?,
                        allergies: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT allergen, severity, reaction FROM allergies
             WHERE patient_id = ?1 ORDER BY position",
        )?;
        record.allergies = stmt
            .query_map(params![record.patient_id], |row| {
                Ok(AllergyRecord {
                    allergen: row.get(0)?,
                    severity: row.get(1)?,
                    reaction: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PatientProfile::try_from(record)?))
    }

    fn list_drugs(&self) -> Result<Vec<Drug>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT drug_id, drug_name, generic_name, rxcui FROM drugs ORDER BY rowid",
        )?;
        let records = stmt
            .query_map([], Self::drug_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut drugs = Vec::with_capacity(records.len());
        for mut record in records {
            record.classes = Self::load_classes(&conn, &record.drug_id)?;
            drugs.push(Drug::try_from(record)?);
        }
        Ok(drugs)
    }

    fn ping(&self) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
