//! JSON salvage helpers for generative model output.
//!
//! Models are instructed to answer with a bare JSON object but routinely wrap
//! it in markdown fences or prose. These helpers dig the object out; actual
//! field validation happens through typed deserialization at each stage.

use serde::de::DeserializeOwned;

/// Extract a JSON object from model output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a ```json code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    // Wrapped in a bare code block
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Object embedded in surrounding prose
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

/// Parse model output into a typed stage response.
///
/// Missing required fields and malformed JSON both come back as `Err` —
/// the caller treats either as a degraded result and falls back.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let json = extract_json_object(raw);
    serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct Sample {
        category: String,
        confidence: f64,
    }

    #[test]
    fn extract_direct_object() {
        let input = r#"{"category": "Work"}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extract_from_json_fence() {
        let input = "```json\n{\"category\": \"Work\"}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("Work"));
    }

    #[test]
    fn extract_from_bare_fence() {
        let input = "```\n{\"category\": \"Spam\"}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("Spam"));
    }

    #[test]
    fn extract_embedded_in_prose() {
        let input = "Here is my answer: {\"category\": \"Personal\", \"confidence\": 0.9} hope that helps.";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }

    #[test]
    fn parse_valid_object() {
        let parsed: Sample =
            parse_object(r#"{"category": "Work", "confidence": 0.8}"#).unwrap();
        assert_eq!(parsed.category, "Work");
        assert!((parsed.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_missing_field_fails() {
        let result: Result<Sample, _> = parse_object(r#"{"category": "Work"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_non_json_fails() {
        let result: Result<Sample, _> = parse_object("I could not decide on a category.");
        assert!(result.is_err());
    }
}
