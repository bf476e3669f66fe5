//! Interaction detection over a validated drug set
//!
//! Every unordered pair is looked up in both directions, in canonical order,
//! so the chosen fact never depends on the order drugs were supplied in.

use crate::EngineError;
use rxsentry_domain::traits::DrugCatalog;
use rxsentry_domain::{DetectedInteraction, Drug, DrugId, DrugPair, InteractionFact};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::debug;

/// Resolved drugs and their detected interactions
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Catalog records, in input order
    pub drugs: Vec<Drug>,
    /// Facts sorted most dangerous first, ties by pair enumeration order
    pub interactions: Vec<DetectedInteraction>,
}

/// Validate a raw identifier list
///
/// Rejects empty lists, lists longer than `max_drugs`, blank identifiers and
/// duplicates (after trimming).
pub fn validate_drug_ids<S: AsRef<str>>(ids: &[S], max_drugs: usize) -> Result<Vec<DrugId>, EngineError> {
    if ids.is_empty() {
        return Err(EngineError::InvalidInput("at least one drug id is required".to_string()));
    }
    if ids.len() > max_drugs {
        return Err(EngineError::InvalidInput(format!(
            "{} drug ids supplied, at most {} allowed",
            ids.len(),
            max_drugs
        )));
    }

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(ids.len());
    for raw in ids {
        let id = DrugId::new(raw.as_ref());
        if id.is_empty() {
            return Err(EngineError::InvalidInput("drug ids must not be blank".to_string()));
        }
        if !seen.insert(id.clone()) {
            return Err(EngineError::InvalidInput(format!("duplicate drug id: {}", id)));
        }
        validated.push(id);
    }
    Ok(validated)
}

fn catalog_error<E: Display>(e: E) -> EngineError {
    EngineError::Catalog(e.to_string())
}

/// Keep the most severe fact; the first seen wins among equal severities
fn canonical_fact(candidates: Vec<InteractionFact>) -> Option<InteractionFact> {
    let mut best: Option<InteractionFact> = None;
    for fact in candidates {
        let replace = match &best {
            Some(current) => fact.severity < current.severity,
            None => true,
        };
        if replace {
            best = Some(fact);
        }
    }
    best
}

/// Resolve drugs and find every interaction among them
///
/// `ids` must already be validated. Unknown ids are rejected as invalid
/// input; catalog failures surface as [`EngineError::Catalog`].
pub fn detect<C>(catalog: &C, ids: &[DrugId]) -> Result<Detection, EngineError>
where
    C: DrugCatalog + ?Sized,
    C::Error: Display,
{
    let mut drugs = Vec::with_capacity(ids.len());
    for id in ids {
        match catalog.get_drug(id).map_err(catalog_error)? {
            Some(drug) => drugs.push(drug),
            None => {
                return Err(EngineError::InvalidInput(format!("unknown drug id: {}", id)));
            }
        }
    }

    let mut interactions = Vec::new();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let pair = DrugPair::new(ids[i].clone(), ids[j].clone());
            let mut candidates = catalog
                .find_interactions(pair.first(), pair.second())
                .map_err(catalog_error)?;
            candidates.extend(
                catalog
                    .find_interactions(pair.second(), pair.first())
                    .map_err(catalog_error)?,
            );

            if let Some(fact) = canonical_fact(candidates) {
                debug!(pair = %pair, severity = %fact.severity, "Interaction detected");
                interactions.push(DetectedInteraction {
                    detection_index: interactions.len(),
                    pair,
                    fact,
                });
            }
        }
    }

    // Stable sort keeps enumeration order within a severity
    interactions.sort_by(|a, b| a.fact.severity.cmp(&b.fact.severity));

    Ok(Detection { drugs, interactions })
}
