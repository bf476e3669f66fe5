//! openFDA adverse event source (low authority)
//!
//! Counts FAERS reports listing both drugs. The report count is the match
//! strength compared against the configured threshold.

use crate::{VerdictProvider, VerifyError};
use async_trait::async_trait;
use rxsentry_domain::{Drug, SourceAuthority, VerdictOutcome};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default openFDA base URL
pub const DEFAULT_BASE_URL: &str = "https://api.fda.gov";

/// openFDA-backed verification source
pub struct OpenFdaProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenFdaProvider {
    /// Create a provider against `base_url`
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

/// Escape characters with meaning in openFDA query syntax
pub(crate) fn escape_query_value(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\\'))
        .collect()
}

/// Search expression matching reports that list both drugs
pub(crate) fn build_search(a: &Drug, b: &Drug) -> String {
    format!(
        "patient.drug.openfda.generic_name:\"{}\" AND patient.drug.openfda.generic_name:\"{}\"",
        escape_query_value(&a.generic_name),
        escape_query_value(&b.generic_name)
    )
}

/// Total report count from a search response
pub(crate) fn parse_total(body: &Value) -> Result<u64, VerifyError> {
    body.pointer("/meta/results/total")
        .and_then(Value::as_u64)
        .ok_or_else(|| VerifyError::InvalidResponse("missing meta.results.total".to_string()))
}

#[async_trait]
impl VerdictProvider for OpenFdaProvider {
    fn source_id(&self) -> &str {
        "openfda"
    }

    fn authority(&self) -> SourceAuthority {
        SourceAuthority::Low
    }

    async fn verify(&self, a: &Drug, b: &Drug) -> Result<VerdictOutcome, VerifyError> {
        let url = format!("{}/drug/event.json", self.base_url);
        let mut query = vec![
            ("search", build_search(a, b)),
            ("limit", "1".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        // openFDA answers 404 when a search has no results
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(drug_a = %a.id, drug_b = %b.id, "openFDA: no reports");
            return Ok(VerdictOutcome::NotMatched);
        }
        if !response.status().is_success() {
            return Err(VerifyError::Http(format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        let total = parse_total(&body)?;

        debug!(drug_a = %a.id, drug_b = %b.id, reports = total, "openFDA lookup");
        if total == 0 {
            Ok(VerdictOutcome::NotMatched)
        } else {
            Ok(VerdictOutcome::Matched {
                strength: total as f64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_search_uses_generic_names() {
        let a = Drug::new("W", "Coumadin").with_generic_name("warfarin");
        let b = Drug::new("A", "Aspirin \"EC\"");
        let search = build_search(&a, &b);
        assert!(search.contains("generic_name:\"warfarin\""));
        assert!(search.contains("generic_name:\"Aspirin EC\""));
        assert!(search.contains(" AND "));
    }

    #[test]
    fn test_parse_total() {
        let body = json!({"meta": {"results": {"skip": 0, "limit": 1, "total": 342}}, "results": []});
        assert_eq!(parse_total(&body).unwrap(), 342);
        assert!(parse_total(&json!({"results": []})).is_err());
    }
}
