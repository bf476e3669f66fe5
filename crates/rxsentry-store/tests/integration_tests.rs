//! Integration tests for the catalog backends

use rxsentry_domain::traits::DrugCatalog;
use rxsentry_domain::{DrugId, SeverityLevel, Sex};
use rxsentry_store::{CatalogSeed, InMemoryCatalog, SqliteCatalog, StoreError};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const SEED: &str = r#"{
    "drugs": [
        {"drug_id": "DRUG_001", "drug_name": "Warfarin", "classes": ["anticoagulant"], "rxcui": "11289"},
        {"drug_id": "DRUG_002", "drug_name": "Aspirin", "classes": ["nsaid", "antiplatelet"], "rxcui": "1191"},
        {"drug_id": "DRUG_003", "drug_name": "Simvastatin", "classes": ["statin"]}
    ],
    "interactions": [
        {"interaction_id": "INT_001", "drug_a": "DRUG_002", "drug_b": "DRUG_001",
         "severity_level": "SERIOUS", "description": "Additive bleeding risk",
         "clinical_effects": "GI bleeding", "management_recommendations": "Monitor INR",
         "documented_adverse_outcomes": true},
        {"interaction_id": "INT_002", "drug_a": "DRUG_003", "drug_b": "DRUG_001",
         "severity_level": "minor"}
    ],
    "patients": [
        {"patient_id": "PAT_001", "age": 78, "weight_kg": 62.5, "sex": "female",
         "serum_creatinine": 1.4, "renal_impairment": true, "chronic_conditions": 3,
         "allergies": [
            {"allergen": "Penicillin", "severity": "severe", "reaction": "anaphylaxis"},
            {"allergen": "nsaid", "severity": "moderate", "reaction": "urticaria"}
         ],
         "current_drug_count": 6}
    ]
}"#;

fn seed_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SEED.as_bytes()).unwrap();
    file
}

fn assert_catalog_contents<C: DrugCatalog>(catalog: &C)
where
    C::Error: std::fmt::Debug,
{
    let drugs = catalog.list_drugs().unwrap();
    assert_eq!(drugs.len(), 3);
    assert_eq!(drugs[0].id.as_str(), "DRUG_001");

    let aspirin = catalog.get_drug(&DrugId::new("DRUG_002")).unwrap().unwrap();
    assert!(aspirin.has_class("antiplatelet"));
    assert_eq!(aspirin.rxcui.as_deref(), Some("1191"));
    assert!(catalog.get_drug(&DrugId::new("DRUG_999")).unwrap().is_none());

    // Stored as (DRUG_002, DRUG_001) only
    let forward = catalog
        .find_interactions(&DrugId::new("DRUG_001"), &DrugId::new("DRUG_002"))
        .unwrap();
    let backward = catalog
        .find_interactions(&DrugId::new("DRUG_002"), &DrugId::new("DRUG_001"))
        .unwrap();
    assert!(forward.is_empty());
    assert_eq!(backward.len(), 1);
    assert_eq!(backward[0].severity, SeverityLevel::Serious);
    assert!(backward[0].documented_adverse_outcomes);
    assert_eq!(backward[0].management, "Monitor INR");

    let patient = catalog.get_patient("PAT_001").unwrap().unwrap();
    assert_eq!(patient.sex, Sex::Female);
    assert_eq!(patient.allergy_count(), 2);
    assert_eq!(patient.allergies[1].allergen, "nsaid");
    assert!(patient.renal_impairment);
    assert_eq!(patient.current_drug_count, 6);

    assert!(catalog.ping().is_ok());
}

#[test]
fn test_in_memory_catalog_from_file() {
    let file = seed_file();
    let catalog = InMemoryCatalog::from_file(file.path()).unwrap();
    assert_catalog_contents(&catalog);
}

#[test]
fn test_sqlite_catalog_on_disk() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");

    {
        let seed = CatalogSeed::from_file(seed_file().path()).unwrap();
        let catalog = SqliteCatalog::from_seed(&db_path, seed).unwrap();
        assert_catalog_contents(&catalog);
    }

    // Reopen: data persists and the schema is not recreated
    let reopened = SqliteCatalog::new(&db_path).unwrap();
    assert_catalog_contents(&reopened);
}

#[test]
fn test_interaction_with_unknown_drug_rejected() {
    let seed = CatalogSeed::from_json(
        r#"{
            "drugs": [{"drug_id": "A", "drug_name": "Alpha"}],
            "interactions": [{"interaction_id": "I1", "drug_a": "A", "drug_b": "Z", "severity_level": "minor"}]
        }"#,
    )
    .unwrap();

    let result = InMemoryCatalog::from_seed(seed);
    assert!(matches!(result, Err(StoreError::InvalidData(_))));
}

#[test]
fn test_invalid_sex_rejected_by_both_backends() {
    let json = r#"{"patients": [{"patient_id": "P", "age": 40, "weight_kg": 70, "sex": "unknown"}]}"#;

    let result = InMemoryCatalog::from_seed(CatalogSeed::from_json(json).unwrap());
    assert!(matches!(result, Err(StoreError::InvalidData(_))));

    let sqlite = SqliteCatalog::new(":memory:").unwrap();
    let result = sqlite.import_seed(CatalogSeed::from_json(json).unwrap());
    assert!(matches!(result, Err(StoreError::InvalidData(_))));
    assert!(sqlite.get_patient("P").unwrap().is_none());
}

#[test]
fn test_malformed_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    assert!(matches!(
        InMemoryCatalog::from_file(file.path()),
        Err(StoreError::Parse(_))
    ));
    assert!(matches!(
        InMemoryCatalog::from_file("/nonexistent/catalog.json"),
        Err(StoreError::Io(_))
    ));
}
