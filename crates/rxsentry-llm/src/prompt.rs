//! Prompt construction and response parsing
//!
//! The model is asked for a JSON object with `analysis` and
//! `recommendations`. Models do not always comply, so parsing falls back to
//! treating the whole response as analysis text.

use crate::{LlmError, Narrative, NarrativeRequest};
use serde::Deserialize;

/// Build the generation prompt for one check
pub fn build_prompt(request: &NarrativeRequest) -> String {
    let mut prompt = String::from(
        "You are a clinical pharmacist reviewing a medication regimen for drug-drug interactions.\n\n",
    );

    prompt.push_str("Medications:\n");
    for drug in &request.drugs {
        prompt.push_str(&format!("- {}\n", drug));
    }

    if request.interactions.is_empty() {
        prompt.push_str("\nNo interactions were found in the reference catalog.\n");
    } else {
        prompt.push_str("\nKnown interactions:\n");
        for interaction in &request.interactions {
            prompt.push_str(&format!(
                "- {} + {} [{}]: {}\n",
                interaction.drug_a, interaction.drug_b, interaction.severity, interaction.description
            ));
        }
    }

    if let Some(summary) = &request.patient_summary {
        prompt.push_str(&format!("\nPatient: {}\n", summary));
    }

    prompt.push_str(
        "\nSummarize the clinical significance in two to four sentences and list concrete \
         monitoring or management recommendations. Respond only with JSON of the form \
         {\"analysis\": \"...\", \"recommendations\": [\"...\"]}.",
    );
    prompt
}

#[derive(Deserialize)]
struct StructuredNarrative {
    analysis: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Parse a model response into a narrative
///
/// Accepts a bare JSON object, a JSON object embedded in surrounding text,
/// or plain text. Fails only when the response is empty.
pub fn parse_narrative(response: &str) -> Result<Narrative, LlmError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("Empty response".to_string()));
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(parsed) = serde_json::from_str::<StructuredNarrative>(&trimmed[start..=end]) {
                if !parsed.analysis.trim().is_empty() {
                    return Ok(Narrative {
                        analysis: parsed.analysis.trim().to_string(),
                        recommendations: parsed
                            .recommendations
                            .into_iter()
                            .map(|r| r.trim().to_string())
                            .filter(|r| !r.is_empty())
                            .collect(),
                    });
                }
            }
        }
    }

    Ok(Narrative {
        analysis: trimmed.to_string(),
        recommendations: Vec::new(),
    })
}
