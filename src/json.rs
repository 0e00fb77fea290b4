//! Decoding of JSON produced by the LLM.
//!
//! Model output goes through three steps: locate the JSON payload,
//! parse into an untyped [`serde_json::Value`], then convert to the typed
//! target and run its [`Validate`] checks. Each step fails with a tagged
//! [`LlmOutputError`] and nothing is accepted partially.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmOutputError;

/// Structural checks that serde cannot express (counts, ranges, non-blank text)
pub trait Validate {
    fn validate(&self) -> Result<(), LlmOutputError>;
}

/// Locate the JSON payload in model output.
///
/// Checks a ```json fence anywhere in the text, then a bare ``` fence, then
/// the span from the first `{` or `[` to the last matching closer. Falls back
/// to the trimmed input.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        // Skip a language tag on the opening fence line.
        let body_start = match after.find('\n') {
            Some(n) if after[..n].trim().chars().all(|c| c.is_ascii_alphanumeric()) => n + 1,
            _ => 0,
        };
        if let Some(end) = after[body_start..].find("```") {
            return after[body_start..body_start + end].trim();
        }
    }

    if let Some(start) = text.find(['{', '[']) {
        let close = if text[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = text.rfind(close) {
            if end > start {
                return &text[start..=end];
            }
        }
    }

    text.trim()
}

/// Parse model output into an untyped JSON value
pub fn parse_value(text: &str) -> Result<Value, LlmOutputError> {
    let body = extract_json(text);
    if body.is_empty() {
        return Err(LlmOutputError::Parse {
            message: "empty response".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| LlmOutputError::Parse {
        message: e.to_string(),
    })
}

/// Parse, type and validate model output
pub fn parse_validated<T>(text: &str) -> Result<T, LlmOutputError>
where
    T: DeserializeOwned + Validate,
{
    let value = parse_value(text)?;
    let typed: T = serde_json::from_value(value).map_err(|e| LlmOutputError::Schema {
        path: "$".to_string(),
        message: e.to_string(),
    })?;
    typed.validate()?;
    Ok(typed)
}

/// Validate every item of a list, prefixing failures with `path[index]`
pub fn validate_each<T: Validate>(path: &str, items: &[T]) -> Result<(), LlmOutputError> {
    for (i, item) in items.iter().enumerate() {
        item.validate().map_err(|err| match err {
            LlmOutputError::Schema {
                path: inner,
                message,
            } => LlmOutputError::Schema {
                path: format!("{}[{}].{}", path, i, inner),
                message,
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Require `len` to fall within `min..=max`
pub fn check_count(path: &str, len: usize, min: usize, max: usize) -> Result<(), LlmOutputError> {
    if len < min || len > max {
        return Err(LlmOutputError::schema(
            path,
            format!("expected {}..={} items, got {}", min, max, len),
        ));
    }
    Ok(())
}

/// Require a non-blank string
pub fn check_text(path: &str, value: &str) -> Result<(), LlmOutputError> {
    if value.trim().is_empty() {
        return Err(LlmOutputError::schema(path, "must not be empty"));
    }
    Ok(())
}

/// Require a 1 (catastrophic) ..= 5 (resilient) severity score
pub fn check_score(path: &str, score: u8) -> Result<(), LlmOutputError> {
    if !(1..=5).contains(&score) {
        return Err(LlmOutputError::schema(
            path,
            format!("score must be between 1 and 5, got {}", score),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Listing {
        items: Vec<String>,
    }

    impl Validate for Listing {
        fn validate(&self) -> Result<(), LlmOutputError> {
            check_count("items", self.items.len(), 1, 2)
        }
    }

    #[test]
    fn test_extract_json_fence() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_bare_fence() {
        let text = "  ```\n[1, 2]\n```  ";
        assert_eq!(extract_json(text), "[1, 2]");
    }

    #[test]
    fn test_extract_single_line_fence() {
        assert_eq!(extract_json("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_extract_bare_fence_with_tag_or_inline_body() {
        assert_eq!(extract_json("```javascript\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("```{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fence_after_leading_prose() {
        let text = "Here are the queries:\n```json\n{\"a\": 1}\n```\nLet me know if you need more.";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_unfenced_object_in_prose() {
        let text = "Sure. {\"a\": {\"b\": 2}} Hope that helps!";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 2}}");
        assert_eq!(extract_json("List: [{\"a\": 1}] done"), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_unclosed_fence_falls_back_to_braces() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_unfenced_text_is_trimmed() {
        assert_eq!(extract_json("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(extract_json("  no json here "), "no json here");
    }

    #[test]
    fn test_parse_validated_after_leading_prose() {
        let text = "Here are the results:\n\n```json\n{\"items\": [\"x\", \"y\"]}\n```";
        let listing: Listing = parse_validated(text).unwrap();
        assert_eq!(listing.items, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_value_reports_parse_error() {
        let err = parse_value("not json at all").unwrap_err();
        assert!(matches!(err, LlmOutputError::Parse { .. }));

        let err = parse_value("```json\n```").unwrap_err();
        assert!(matches!(err, LlmOutputError::Parse { .. }));
    }

    #[test]
    fn test_parse_validated_accepts_valid() {
        let listing: Listing = parse_validated("```json\n{\"items\": [\"x\"]}\n```").unwrap();
        assert_eq!(listing.items, vec!["x"]);
    }

    #[test]
    fn test_parse_validated_type_mismatch_is_schema_error() {
        let err = parse_validated::<Listing>("{\"items\": 3}").unwrap_err();
        assert!(matches!(err, LlmOutputError::Schema { .. }));
    }

    #[test]
    fn test_parse_validated_runs_validation() {
        let err = parse_validated::<Listing>("{\"items\": []}").unwrap_err();
        assert_eq!(
            err,
            LlmOutputError::schema("items", "expected 1..=2 items, got 0")
        );
    }

    #[test]
    fn test_validate_each_prefixes_path() {
        let items = vec![
            Listing {
                items: vec!["a".to_string()],
            },
            Listing { items: Vec::new() },
        ];
        let err = validate_each("listings", &items).unwrap_err();
        assert_eq!(
            err,
            LlmOutputError::schema("listings[1].items", "expected 1..=2 items, got 0")
        );
    }

    #[test]
    fn test_check_score_bounds() {
        assert!(check_score("s", 1).is_ok());
        assert!(check_score("s", 5).is_ok());
        assert!(check_score("s", 0).is_err());
        assert!(check_score("s", 6).is_err());
    }

    #[test]
    fn test_check_text_rejects_blank() {
        assert!(check_text("t", "   ").is_err());
        assert!(check_text("t", "ok").is_ok());
    }
}
