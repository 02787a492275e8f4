//! Best-effort structured-output extraction from free-form LLM text.
//!
//! Agents are asked for JSON but frequently wrap it in prose. Every step that
//! wants structure goes through the same fallback chain:
//!
//! 1. greedy `{...}` span match over the raw text
//! 2. `serde_json` parse of the span, kept only if it is an object
//! 3. case-insensitive substring heuristic for boolean flags
//! 4. the caller's default
//!
//! Steps never see a parse error; a failed extraction is just `None`.

use serde_json::{Map, Value};

/// Extract the first greedy `{...}` span from `raw` and parse it as a JSON
/// object. Returns `None` when there is no span or the span is not valid
/// JSON / not an object.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let re = regex::Regex::new(r"(?s)\{.*\}").unwrap();
    let span = re.find(raw)?;
    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Substring heuristic for a boolean flag in free text.
///
/// Matches both the snake_case form (`"can_prepare_general_answer: true"`)
/// and the spaced form (`"can prepare general answer: true"`), ignoring case.
/// `flag` must be the lowercase snake_case flag name.
pub fn flag_is_true(raw: &str, flag: &str) -> bool {
    let lower = raw.to_lowercase();
    let spaced = flag.replace('_', " ");
    lower.contains(&format!("{}: true", flag)) || lower.contains(&format!("{}: true", spaced))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_embedded_in_prose() {
        let raw = "Here is my analysis:\n{\"can_prepare_general_answer\": true, \"confidence_score\": 0.8}\nLet me know.";
        let map = extract_json_object(raw).unwrap();
        assert_eq!(map.get("can_prepare_general_answer"), Some(&Value::Bool(true)));
    }

    #[test]
    fn greedy_span_covers_nested_objects() {
        let raw = "{\"outer\": {\"inner\": 1}} trailing";
        // Greedy match runs to the last `}`, so the whole object parses.
        let map = extract_json_object(raw).unwrap();
        assert!(map.get("outer").unwrap().is_object());
    }

    #[test]
    fn unparseable_span_yields_none() {
        assert!(extract_json_object("text { not json } more").is_none());
        assert!(extract_json_object("no braces at all").is_none());
    }

    #[test]
    fn non_object_json_yields_none() {
        // A span that parses but is not an object is rejected.
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn flag_heuristic_matches_both_forms() {
        assert!(flag_is_true(
            "Can Prepare General Answer: TRUE",
            "can_prepare_general_answer"
        ));
        assert!(flag_is_true(
            "verdict: can_prepare_general_answer: true",
            "can_prepare_general_answer"
        ));
        assert!(!flag_is_true(
            "can_prepare_general_answer: false",
            "can_prepare_general_answer"
        ));
        assert!(!flag_is_true("unrelated text", "can_prepare_general_answer"));
    }
}
