//! JSON parsing helpers for narrative backend responses
//!
//! Models often wrap the JSON payload in extra prose; the parser extracts
//! the outermost object before deserializing.

use chrono::Utc;

use crate::error::{Error, Result};

use super::types::{Narrative, NarrativePayload};

/// Parse a narrative from a model response
pub fn parse_narrative(response: &str, model: &str) -> Result<Narrative> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            let payload: NarrativePayload = serde_json::from_str(json_str).map_err(|e| {
                // Truncate long responses for the error message
                let truncated = if json_str.len() > 200 {
                    format!("{}...", &json_str[..200])
                } else {
                    json_str.to_string()
                };
                Error::InvalidData(format!("Invalid JSON from model: {} | Raw: {}", e, truncated))
            })?;
            Ok(Narrative {
                summary: payload.summary,
                profile_label: payload.profile_label,
                model: model.to_string(),
                generated_at: Utc::now(),
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in model response | Raw: {}",
            if response.len() > 200 {
                format!("{}...", &response[..200])
            } else {
                response.to_string()
            }
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_narrative_with_surrounding_prose() {
        let response = r#"Claro! Segue a análise:
{"summary": "O plano X tem a menor parcela relativa.", "profile_label": "Planejador"}
Espero que ajude."#;

        let narrative = parse_narrative(response, "llama3.2").unwrap();
        assert_eq!(narrative.profile_label, "Planejador");
        assert_eq!(narrative.model, "llama3.2");
    }

    #[test]
    fn test_parse_narrative_rejects_missing_json() {
        assert!(parse_narrative("sem json aqui", "llama3.2").is_err());
    }

    #[test]
    fn test_parse_narrative_rejects_wrong_shape() {
        assert!(parse_narrative(r#"{"foo": 1}"#, "llama3.2").is_err());
    }
}
