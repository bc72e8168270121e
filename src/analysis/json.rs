//! Extraction of JSON payloads from model replies
//!
//! Models are asked for JSON but routinely wrap it in Markdown fences or
//! surround it with prose. These helpers recover the payload.

use crate::error::{Result, WardrobeError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Opening fence with optional language tag, e.g. ```` ```json ````
fn opening_fence() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("Valid opening fence regex"));
    &PATTERN
}

/// Strip a leading Markdown code fence and its closing fence
///
/// Text without a leading fence is returned trimmed. A missing closing
/// fence is tolerated (truncated replies).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = opening_fence().find(trimmed) else {
        return trimmed;
    };

    let body = &trimmed[open.end()..];
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Recover the JSON value from a model reply
///
/// Tries, in order: the fence-stripped text as-is, a fenced block anywhere
/// in the text, then the outermost `{...}` or `[...]` span.
pub fn extract_json(text: &str) -> Result<Value> {
    let stripped = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Ok(value);
    }

    if let Some(start) = text.find("```") {
        let fenced = strip_code_fences(&text[start..]);
        if let Ok(value) = serde_json::from_str::<Value>(fenced) {
            return Ok(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (stripped.find(open), stripped.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str::<Value>(&stripped[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    Err(WardrobeError::ModelOutput(format!(
        "no JSON object found in reply: {}",
        preview(text)
    )))
}

/// Extract JSON and require an object at the top level
pub fn extract_object(text: &str) -> Result<serde_json::Map<String, Value>> {
    match extract_json(text)? {
        Value::Object(map) => Ok(map),
        other => Err(WardrobeError::ModelOutput(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First 120 characters for error messages
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        out.push('…');
    }
    out
}

/// Field accessors tolerant of the shapes models actually return
pub mod fields {
    use serde_json::{Map, Value};

    /// Non-empty trimmed string at `key`. Numbers are stringified.
    pub fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
        match map.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("unknown") {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// List of strings at `key`
    ///
    /// Accepts an array of strings, a comma separated string, or a single
    /// scalar. Empty entries are dropped.
    pub fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
        let raw: Vec<String> = match map.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Object(obj) => obj
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Float at `key`, accepting numeric strings and percentages
    pub fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
        match map.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let s = s.trim();
                match s.strip_suffix('%') {
                    Some(pct) => pct.trim().parse::<f64>().ok().map(|v| v / 100.0),
                    None => s.parse::<f64>().ok(),
                }
            }
            _ => None,
        }
    }

    /// Boolean at `key`, accepting "yes"/"no" and "true"/"false" strings
    pub fn boolean(map: &Map<String, Value>, key: &str) -> Option<bool> {
        match map.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Model-reported confidence, normalised to `[0, 1]`
    ///
    /// Values above 1 are read as percentages.
    pub fn confidence(map: &Map<String, Value>, key: &str) -> Option<f32> {
        let value = number(map, key)?;
        let value = if value > 1.0 { value / 100.0 } else { value };
        if value.is_finite() {
            Some(value.clamp(0.0, 1.0) as f32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fence() {
        let reply = "```json\n{\"name\": \"Blazer\"}\n```";
        assert_eq!(strip_code_fences(reply), "{\"name\": \"Blazer\"}");
    }

    #[test]
    fn test_strip_bare_fence_and_missing_close() {
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_from_prose() {
        let reply = "Here is the analysis:\n{\"category\": \"dress\", \"colors\": [\"red\"]}\nLet me know!";
        let value = extract_json(reply).unwrap();
        assert_eq!(value, json!({"category": "dress", "colors": ["red"]}));
    }

    #[test]
    fn test_extract_json_fence_after_prose() {
        let reply = "Sure.\n```json\n{\"total\": 42.5}\n```\nThanks";
        assert_eq!(extract_json(reply).unwrap(), json!({"total": 42.5}));
    }

    #[test]
    fn test_extract_json_array() {
        let reply = "Items: [{\"name\": \"a\"}, {\"name\": \"b\"}]";
        assert_eq!(extract_json(reply).unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_extract_json_failure_is_model_output_error() {
        let err = extract_json("I cannot see any clothing in this image.").unwrap_err();
        assert!(matches!(err, WardrobeError::ModelOutput(_)));
    }

    #[test]
    fn test_extract_object_rejects_array() {
        assert!(extract_object("[1, 2, 3]").is_err());
        assert!(extract_object("{\"a\": 1}").is_ok());
    }

    #[test]
    fn test_field_coercions() {
        let value = json!({
            "colors": "navy, white ,",
            "fabrics": ["cotton", "", 7, {"name": "linen"}],
            "brand": "Unknown",
            "name": "  Oxford shirt ",
            "confidence": "85%",
            "score": 92,
            "has_lace": "yes",
        });
        let map = value.as_object().unwrap();

        assert_eq!(fields::string_list(map, "colors"), vec!["navy", "white"]);
        assert_eq!(fields::string_list(map, "fabrics"), vec!["cotton", "7", "linen"]);
        assert_eq!(fields::string(map, "brand"), None);
        assert_eq!(fields::string(map, "name").as_deref(), Some("Oxford shirt"));
        assert!((fields::confidence(map, "confidence").unwrap() - 0.85).abs() < 1e-6);
        assert!((fields::confidence(map, "score").unwrap() - 0.92).abs() < 1e-6);
        assert_eq!(fields::boolean(map, "has_lace"), Some(true));
        assert!(fields::string_list(map, "missing").is_empty());
    }
}
