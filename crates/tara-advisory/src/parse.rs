//! Parsing of the model's JSON reply into an [`AdvisoryResult`].

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tara_core::{AdvisoryResult, TaraError};

/// Parses model output. Code fences are stripped, missing keys default to
/// empty, and non-string list items are stringified.
pub fn parse_advice(content: &str) -> Result<AdvisoryResult, TaraError> {
    let body = strip_fences(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TaraError::AdvisoryError(format!("model reply is not JSON: {}", e)))?;

    let Value::Object(object) = value else {
        return Err(TaraError::AdvisoryError(
            "model reply is not a JSON object".to_string(),
        ));
    };

    Ok(AdvisoryResult {
        forms: string_list(&object, "forms"),
        health: string_list(&object, "health"),
        safety: string_list(&object, "safety"),
        outstanding_fields: string_map(&object, "awaiting_feedback"),
    })
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the opening fence
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items.iter().map(as_text).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![as_text(single)],
    }
}

fn string_map(object: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    match object.get(key) {
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(field, reason)| (field.clone(), as_text(reason)))
            .collect(),
        _ => BTreeMap::new(),
    }
}
