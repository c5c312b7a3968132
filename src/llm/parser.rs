//! Output parsers that turn raw model text into stage output.
//!
//! * [`OutputParser::Passthrough`]: trims the text.
//! * [`OutputParser::Json`]: parses a JSON object.  Malformed output never
//!   raises; it becomes the parser's placeholder mapping and the result is
//!   flagged with `parse_error = true`.
//!
//! Models often wrap JSON in a Markdown code fence, so a surrounding
//! `` ```json `` / `` ``` `` pair is removed before parsing.

use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Model output that is not in the expected shape.
///
/// Only surfaces in logs; parsers convert it to placeholder data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

// ---------------------------------------------------------------------------
// StageOutput
// ---------------------------------------------------------------------------

/// Parsed output of one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Text(String),
    Json(Map<String, Value>),
}

impl StageOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StageOutput::Text(text) => Some(text),
            StageOutput::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            StageOutput::Json(map) => Some(map),
            StageOutput::Text(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputParser
// ---------------------------------------------------------------------------

/// How a stage shapes the model's raw reply.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputParser {
    Passthrough,
    Json { placeholder: Map<String, Value> },
}

impl OutputParser {
    pub fn json(placeholder: Map<String, Value>) -> Self {
        OutputParser::Json { placeholder }
    }

    /// Parse `raw`.  Returns the output and whether parsing failed.
    pub fn parse(&self, raw: &str) -> (StageOutput, bool) {
        match self {
            OutputParser::Passthrough => (StageOutput::Text(raw.trim().to_string()), false),
            OutputParser::Json { placeholder } => match parse_json_object(raw) {
                Ok(map) => (StageOutput::Json(map), false),
                Err(e) => {
                    log::warn!("Failed to parse stage JSON ({e}), using fallback");
                    (StageOutput::Json(placeholder.clone()), true)
                }
            },
        }
    }
}

/// Parse `raw` as a JSON object, tolerating whitespace and a code fence.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let body = strip_code_fence(raw);

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ParseError::NotAnObject(json_kind(&other))),
        Err(e) => Err(ParseError::InvalidJson(e.to_string())),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };

    // Drop an info string such as `json` on the opening fence line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn placeholder() -> Map<String, Value> {
        match json!({ "error": "Unable to extract entities due to parsing error" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn passthrough_trims() {
        let (output, failed) = OutputParser::Passthrough.parse("  A fine summary.\n\n");
        assert_eq!(output, StageOutput::Text("A fine summary.".into()));
        assert!(!failed);
    }

    #[test]
    fn json_object_is_parsed() {
        let parser = OutputParser::json(placeholder());
        let (output, failed) = parser.parse(r#"{"role": "Engineer", "location": "Berlin"}"#);

        assert!(!failed);
        let map = output.as_json().unwrap();
        assert_eq!(map["role"], "Engineer");
        assert_eq!(map["location"], "Berlin");
    }

    #[test]
    fn malformed_json_becomes_placeholder() {
        let parser = OutputParser::json(placeholder());
        let (output, failed) = parser.parse("Sure! Here are the details: role is Engineer");

        assert!(failed);
        assert_eq!(output, StageOutput::Json(placeholder()));
    }

    #[test]
    fn placeholder_is_stable_across_calls() {
        let parser = OutputParser::json(placeholder());
        let first = parser.parse("{ not json");
        let second = parser.parse("{ not json");
        assert_eq!(first, second);
    }

    #[test]
    fn code_fences_are_stripped() {
        let fenced = "```json\n{\"highlights\": [\"a\"], \"lowlights\": []}\n```";
        let map = parse_json_object(fenced).unwrap();
        assert_eq!(map["highlights"], json!(["a"]));

        let bare_fence = "```\n{\"k\": \"v\"}\n```";
        assert_eq!(parse_json_object(bare_fence).unwrap()["k"], "v");

        let one_line = "```{\"k\": 1}```";
        assert_eq!(parse_json_object(one_line).unwrap()["k"], 1);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert_eq!(
            parse_json_object("[1, 2, 3]").unwrap_err(),
            ParseError::NotAnObject("an array")
        );
        assert_eq!(
            parse_json_object("\"text\"").unwrap_err(),
            ParseError::NotAnObject("a string")
        );
    }

    #[test]
    fn invalid_json_reports_reason() {
        let err = parse_json_object("{\"a\": }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
        assert!(err.to_string().starts_with("output is not valid JSON"));
    }

    #[test]
    fn output_accessors() {
        let text = StageOutput::Text("hi".into());
        assert_eq!(text.as_text(), Some("hi"));
        assert!(text.as_json().is_none());
        assert!(StageOutput::Json(Map::new()).as_text().is_none());
    }
}
