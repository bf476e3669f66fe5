//! RxNorm interaction source (high authority)
//!
//! Queries the RxNav interaction list endpoint with the RXCUIs of both
//! drugs. Any returned interaction group counts as a match.

use crate::{VerdictProvider, VerifyError};
use async_trait::async_trait;
use rxsentry_domain::{Drug, SourceAuthority, VerdictOutcome};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default RxNav base URL
pub const DEFAULT_BASE_URL: &str = "https://rxnav.nlm.nih.gov";

/// RxNorm-backed verification source
pub struct RxNormProvider {
    base_url: String,
    client: reqwest::Client,
}

impl RxNormProvider {
    /// Create a provider against `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn rxcui<'a>(drug: &'a Drug) -> Result<&'a str, VerifyError> {
        drug.rxcui
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerifyError::MissingIdentifier(format!("{} has no RXCUI", drug.id)))
    }
}

/// Interpret an interaction list response body
pub(crate) fn parse_interaction_list(body: &Value) -> VerdictOutcome {
    let groups = body
        .get("fullInteractionTypeGroup")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.get("fullInteractionType").and_then(Value::as_array))
                .map(Vec::len)
                .sum::<usize>()
        })
        .unwrap_or(0);

    if groups > 0 {
        VerdictOutcome::Matched {
            strength: groups as f64,
        }
    } else {
        VerdictOutcome::NotMatched
    }
}

#[async_trait]
impl VerdictProvider for RxNormProvider {
    fn source_id(&self) -> &str {
        "rxnorm"
    }

    fn authority(&self) -> SourceAuthority {
        SourceAuthority::High
    }

    async fn verify(&self, a: &Drug, b: &Drug) -> Result<VerdictOutcome, VerifyError> {
        let rxcuis = format!("{} {}", Self::rxcui(a)?, Self::rxcui(b)?);
        let url = format!("{}/REST/interaction/list.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("rxcuis", rxcuis.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Http(format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

        let outcome = parse_interaction_list(&body);
        debug!(drug_a = %a.id, drug_b = %b.id, matched = outcome.is_match(), "RxNorm lookup");
        Ok(outcome)
    }
}
