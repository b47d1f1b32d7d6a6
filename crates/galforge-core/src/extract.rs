//! Structured output extraction.
//!
//! Pulls one JSON object out of free-form backend text. Only two recoveries
//! are attempted: stripping a markdown fence and slicing from the first `{`
//! to the last `}`. Malformed JSON is never patched here; the repair loop
//! asks the backend to fix it instead.

use galforge_contracts::{agent::JsonObject, error::ExtractionError};
use serde_json::Value;

/// Characters of raw text kept in an `ExtractionError` excerpt.
pub const EXCERPT_CHARS: usize = 500;

/// Extract a JSON object from raw backend text.
pub fn extract(raw: &str) -> Result<JsonObject, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(failure("backend returned an empty response", raw));
    }

    let body = match strip_fence(trimmed) {
        "" => trimmed,
        stripped => stripped,
    };

    if let Some(object) = parse_object(body) {
        return Ok(object);
    }

    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end {
            if let Some(object) = parse_object(&body[start..=end]) {
                return Ok(object);
            }
        }
    }

    Err(failure("no parseable JSON object found in response", raw))
}

/// Remove an opening ```` ``` ```` line and a trailing closing fence.
fn strip_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    let without_open = match text.find('\n') {
        Some(newline) => &text[newline + 1..],
        None => "",
    };
    let without_close = without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open);
    without_close.trim()
}

fn parse_object(text: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn failure(reason: &str, raw: &str) -> ExtractionError {
    ExtractionError {
        reason: reason.to_string(),
        excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn as_object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_plain_object_parses_directly() {
        let out = extract(r#"  {"genre": "romance", "tone": "warm"}  "#).unwrap();
        assert_eq!(out["genre"], json!("romance"));
    }

    #[test]
    fn test_fenced_object_is_unwrapped() {
        let raw = "```json\n{\"genre\": \"romance\", \"themes\": [\"youth\"], \"tone\": \"warm\", \"must_have\": [], \"forbidden\": []}\n```";
        let out = extract(raw).unwrap();
        assert_eq!(out["themes"], json!(["youth"]));
        assert_eq!(out["forbidden"], json!([]));
    }

    #[test]
    fn test_fence_without_language_tag_is_unwrapped() {
        let out = extract("```\n{\"a\": 1}\n```").unwrap();
        assert_eq!(out["a"], json!(1));
    }

    #[test]
    fn test_commentary_around_object_is_sliced_away() {
        let raw = "Sure! Here is the world setting:\n{\"era\": \"modern\", \"city\": {\"name\": \"Kamakura\"}}\nLet me know if you need changes.";
        let out = extract(raw).unwrap();
        assert_eq!(out["city"]["name"], json!("Kamakura"));
    }

    #[test]
    fn test_fenced_object_with_surrounding_prose_survives_extraction() {
        let original = as_object(json!({
            "heroines": [
                { "name": "Aoi", "motivation": "win the regional final" },
                { "name": "Rin", "motivation": null }
            ],
            "count": 2
        }));
        let wrapped = format!(
            "Here you go.\n```json\n{}\n```\nHope this helps!",
            serde_json::to_string_pretty(&original).unwrap()
        );
        assert_eq!(extract(&wrapped).unwrap(), original);
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let err = extract("   \n\t ").unwrap_err();
        assert!(err.reason.contains("empty"));
    }

    #[test]
    fn test_trailing_comma_is_not_repaired() {
        let err = extract(r#"{"genre": "romance",}"#).unwrap_err();
        assert!(err.reason.contains("no parseable JSON object"));
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        assert!(extract("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let raw = "x".repeat(2_000);
        let err = extract(&raw).unwrap_err();
        assert_eq!(err.excerpt.chars().count(), EXCERPT_CHARS);
    }
}
