//! Allergy cross-check between a patient's records and the checked drugs

use rxsentry_domain::{AllergyAlert, AllergyMatch, Drug, PatientProfile};
use tracing::debug;

/// Lower-case, trimmed, with a trailing plural "s" removed
fn normalize(term: &str) -> String {
    let lower = term.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => lower,
    }
}

fn names_drug(allergen: &str, drug: &Drug) -> bool {
    let allergen = normalize(allergen);
    [drug.name.as_str(), drug.generic_name.as_str(), drug.id.as_str()]
        .iter()
        .any(|name| normalize(name) == allergen)
}

fn names_class(allergen: &str, drug: &Drug) -> bool {
    let allergen = normalize(allergen);
    drug.classes.iter().any(|class| normalize(class) == allergen)
}

fn recommendation(kind: AllergyMatch, allergen: &str, drug: &Drug) -> String {
    match kind {
        AllergyMatch::Direct => format!(
            "Patient is allergic to {}. Do not administer {}; select an alternative.",
            allergen, drug.name
        ),
        AllergyMatch::Class => format!(
            "{} belongs to the {} class the patient is allergic to. Assess cross-reactivity before use.",
            drug.name, allergen
        ),
    }
}

/// Match every allergy record against every checked drug
///
/// A direct match (allergen names the drug) takes precedence over a class
/// match for the same allergy and drug. Matching ignores case and a plural
/// "s", so "Penicillins" matches the "penicillin" class.
pub fn check_allergies(patient: &PatientProfile, drugs: &[Drug]) -> Vec<AllergyAlert> {
    let mut alerts = Vec::new();
    for allergy in &patient.allergies {
        for drug in drugs {
            let kind = if names_drug(&allergy.allergen, drug) {
                AllergyMatch::Direct
            } else if names_class(&allergy.allergen, drug) {
                AllergyMatch::Class
            } else {
                continue;
            };

            debug!(
                patient_id = %patient.id,
                allergen = %allergy.allergen,
                drug_id = %drug.id,
                kind = kind.as_str(),
                "Allergy match"
            );
            alerts.push(AllergyAlert {
                allergen: allergy.allergen.clone(),
                drug_id: drug.id.to_string(),
                drug_name: drug.name.clone(),
                match_kind: kind,
                severity: allergy.severity.clone(),
                reaction: allergy.reaction.clone(),
                recommendation: recommendation(kind, &allergy.allergen, drug),
            });
        }
    }
    alerts
}
