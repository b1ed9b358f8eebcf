use std::sync::LazyLock;

use regex::Regex;
use fitroom_common::traits::schema_traits::ResponseSchema;

/// Appended to the prompt on the single repair attempt.
pub const REPAIR_INSTRUCTION: &str = "[RETRY] Your previous response failed schema validation. \
Return ONLY valid JSON that strictly matches the required structure and allowed enum values. \
No markdown, no code fences, no extra keys.";

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```(?:json)?\s*(.*?)```\s*\z").expect("fence pattern compiles"));

/// Pulls the JSON document out of model text: fenced ```json blocks first,
/// otherwise the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = FENCED_JSON.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(first), Some(last)) if last > first => &trimmed[first..=last],
        _ => trimmed,
    }
}

/// Extracts, deserializes and validates a model response against `T`.
pub fn parse_structured<T: ResponseSchema>(text: &str) -> Result<T, String> {
    let candidate = extract_json(text);
    if candidate.is_empty() {
        return Err("empty response".to_string());
    }
    let value: T = serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {e}"))?;
    value.validate().map_err(|e| format!("schema validation failed: {e}"))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Ack {
        ok: bool,
    }

    impl ResponseSchema for Ack {
        fn validate(&self) -> Result<(), String> {
            if self.ok { Ok(()) } else { Err("ok must be true".into()) }
        }
    }

    #[test]
    fn extracts_from_code_fence() {
        assert_eq!(extract_json("```json\n{\"ok\":true}\n```"), "{\"ok\":true}");
        assert_eq!(extract_json("```\n{\"ok\":true}```"), "{\"ok\":true}");
    }

    #[test]
    fn extracts_from_surrounding_prose() {
        assert_eq!(extract_json("Sure! {\"ok\":true} hope this helps"), "{\"ok\":true}");
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn parse_runs_schema_validation() {
        assert!(parse_structured::<Ack>("{\"ok\":true}").is_ok());
        let err = parse_structured::<Ack>("{\"ok\":false}").unwrap_err();
        assert!(err.contains("schema validation failed"));
        assert!(parse_structured::<Ack>("{\"ok\":").unwrap_err().contains("invalid JSON"));
        assert!(parse_structured::<Ack>("   ").is_err());
    }
}
