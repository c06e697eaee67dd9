//! Best-effort recovery of the feedback document from free-form model text.

use tracing::error;

use crate::errors::AppError;
use crate::llm_client::strip_json_fences;
use crate::models::feedback::Feedback;

const LOG_PREVIEW_CHARS: usize = 200;

/// Locates the first JSON-looking span in `text`.
///
/// Scanning left to right, the first `{` that has a `}` somewhere after it (or
/// the first `[` with a later `]`) starts the span, which then runs greedily to
/// the last matching closer in the text.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let last_brace = text.rfind('}');
    let last_bracket = text.rfind(']');

    text.char_indices().find_map(|(start, c)| {
        let close = match c {
            '{' => last_brace,
            '[' => last_bracket,
            _ => return None,
        }?;
        (close > start).then(|| &text[start..=close])
    })
}

/// Parses and validates the model's answer into [`Feedback`].
///
/// Code fences are stripped, the JSON span is located (the whole text is tried
/// when there is none), and the result must match the feedback schema with
/// every score in range. Anything else is a format error.
pub fn parse_feedback(raw: &str) -> Result<Feedback, AppError> {
    let text = strip_json_fences(raw);
    let candidate = extract_json_span(text).unwrap_or(text);

    let feedback: Feedback = serde_json::from_str(candidate).map_err(|e| {
        error!(
            "LLM response is not valid feedback JSON ({e}). Attempted parse: {}",
            preview(candidate, LOG_PREVIEW_CHARS)
        );
        AppError::Format(format!("LLM response is not valid feedback JSON: {e}"))
    })?;

    feedback
        .validate()
        .map_err(|reason| AppError::Format(format!("LLM feedback rejected: {reason}")))?;

    Ok(feedback)
}

/// First `max_chars` characters on a single line, for logs.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::{sample_feedback, TipKind};

    fn feedback_json() -> String {
        serde_json::to_string_pretty(&sample_feedback()).unwrap()
    }

    #[test]
    fn test_span_is_greedy_to_last_brace() {
        let text = r#"Sure! {"a": {"b": 1}} and {"c": 2} done"#;
        assert_eq!(
            extract_json_span(text),
            Some(r#"{"a": {"b": 1}} and {"c": 2}"#)
        );
    }

    #[test]
    fn test_span_array() {
        assert_eq!(extract_json_span("list: [1, 2] end"), Some("[1, 2]"));
    }

    #[test]
    fn test_span_skips_opener_without_closer() {
        // the `[` has no `]` after it, so the object wins
        assert_eq!(extract_json_span(r#"[ oops {"x": 1}"#), Some(r#"{"x": 1}"#));
    }

    #[test]
    fn test_no_span() {
        assert_eq!(extract_json_span("no structured data here"), None);
        assert_eq!(extract_json_span("} backwards {"), None);
    }

    #[test]
    fn test_text_without_json_is_a_format_error() {
        let result = parse_feedback("I'm sorry, I can't review this resume.");
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn test_empty_response_is_a_format_error() {
        assert!(matches!(parse_feedback(""), Err(AppError::Format(_))));
    }

    #[test]
    fn test_well_formed_feedback_round_trips() {
        let parsed = parse_feedback(&feedback_json()).unwrap();
        assert_eq!(parsed, sample_feedback());
    }

    #[test]
    fn test_feedback_wrapped_in_prose_and_fences() {
        let raw = format!(
            "Here is the evaluation you asked for:\n```json\n{}\n```\nGood luck!",
            feedback_json()
        );
        let parsed = parse_feedback(&raw).unwrap();
        assert_eq!(parsed.overall_score, 74.0);
        assert_eq!(parsed.content.tips[0].kind, TipKind::Improve);
    }

    #[test]
    fn test_fenced_feedback() {
        let raw = format!("```json\n{}\n```", feedback_json());
        assert_eq!(parse_feedback(&raw).unwrap(), sample_feedback());
    }

    #[test]
    fn test_missing_section_is_a_format_error() {
        let mut value = serde_json::to_value(sample_feedback()).unwrap();
        value.as_object_mut().unwrap().remove("skills");
        let result = parse_feedback(&value.to_string());
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn test_out_of_range_score_is_a_format_error() {
        let mut value = serde_json::to_value(sample_feedback()).unwrap();
        value["ATS"]["score"] = serde_json::json!(250);
        let result = parse_feedback(&value.to_string());
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn test_recommendation_is_optional() {
        let mut value = serde_json::to_value(sample_feedback()).unwrap();
        value.as_object_mut().unwrap().remove("recommendation");
        let parsed = parse_feedback(&value.to_string()).unwrap();
        assert!(parsed.recommendation.is_none());
    }

    #[test]
    fn test_preview_is_single_line_and_bounded() {
        assert_eq!(preview("a\nb\r\nc", 10), "a b  c");
        assert_eq!(preview("abcdef", 3), "abc");
    }
}
