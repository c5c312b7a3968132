//! Result assembly and the fallback policy.
//!
//! Stage outputs are merged into the response records here.  A stage that
//! failed contributes its placeholder instead of being left empty, and a
//! pipeline that could not run at all gets a complete fallback record.
//! Nothing in this module fails.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

use super::classification::Classification;
use super::error::ProcessingError;
use super::result::{FeedbackResult, InterviewResult};
use crate::input::FeedbackInput;
use crate::llm::{StageOutput, StageResult};

// ---------------------------------------------------------------------------
// Interview placeholders
// ---------------------------------------------------------------------------

pub const HIGHLIGHTS_PARSE_FAILURE: &str = "Unable to extract highlights due to parsing error";
pub const LOWLIGHTS_PARSE_FAILURE: &str = "Unable to extract lowlights due to parsing error";
pub const ENTITIES_PARSE_FAILURE: &str = "Unable to extract entities due to parsing error";
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary due to processing error";

pub const FALLBACK_SUMMARY: &str = "Unable to process interview transcript due to technical \
difficulties. Please try again or contact support.";
pub const FALLBACK_HIGHLIGHT: &str = "Processing failed - unable to extract highlights";
pub const FALLBACK_LOWLIGHT: &str = "Processing failed - unable to extract lowlights";
pub const FALLBACK_ENTITIES: &str =
    "Unable to extract candidate information due to processing failure";

/// Entity value used when the model answers `null`.
const NOT_MENTIONED: &str = "Not mentioned";

// ---------------------------------------------------------------------------
// Feedback texts
// ---------------------------------------------------------------------------

pub const VALIDATION_APOLOGY: &str = "We apologize, but there was an issue processing your \
feedback. Please contact our customer service team for assistance.";

/// Reply used when response generation fails.
pub fn canned_response(product_name: &str) -> String {
    format!(
        "Thank you for your feedback about {product_name}. We appreciate your input. \
         For assistance, please contact our customer service team."
    )
}

/// Reply used when the pipeline fails for a reason other than validation.
pub fn technical_difficulties_response(product_name: &str) -> String {
    let product = if product_name.trim().is_empty() {
        "your product"
    } else {
        product_name
    };
    format!(
        "Thank you for your feedback about {product}. We're currently experiencing technical \
         difficulties. Our team will review your feedback and respond soon. For immediate \
         assistance, please contact support."
    )
}

/// Seconds rounded to milliseconds.
pub fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Parser placeholder for the highlights/lowlights stage.
pub fn highlights_placeholder() -> Map<String, Value> {
    json_object(serde_json::json!({
        "highlights": [HIGHLIGHTS_PARSE_FAILURE],
        "lowlights": [LOWLIGHTS_PARSE_FAILURE],
    }))
}

/// Parser placeholder for the entities stage.
pub fn entities_placeholder() -> Map<String, Value> {
    json_object(serde_json::json!({ "error": ENTITIES_PARSE_FAILURE }))
}

// ---------------------------------------------------------------------------
// Interview assembly
// ---------------------------------------------------------------------------

/// Per-stage outcomes of one interview run.
#[derive(Debug)]
pub struct InterviewStageOutcomes {
    pub summary: Result<StageResult, ProcessingError>,
    pub highlights: Result<StageResult, ProcessingError>,
    pub entities: Result<StageResult, ProcessingError>,
}

/// Merge the three stage outcomes.
///
/// Parse failures keep `success = true` (their placeholders are the data).
/// A failed stage contributes its placeholder and marks the result degraded
/// with `success = false` and an `error` naming every failed stage.
pub fn assemble_interview(
    model: &str,
    outcomes: InterviewStageOutcomes,
    elapsed: Duration,
) -> InterviewResult {
    let mut failures: Vec<ProcessingError> = Vec::new();

    let summary = match outcomes.summary {
        Ok(result) => summary_text(result.parsed),
        Err(e) => {
            failures.push(e);
            SUMMARY_UNAVAILABLE.to_string()
        }
    };

    let (highlights, lowlights) = match outcomes.highlights {
        Ok(result) => split_highlights(result.parsed),
        Err(e) => {
            failures.push(e);
            split_highlights(StageOutput::Json(highlights_placeholder()))
        }
    };

    let key_named_entities = match outcomes.entities {
        Ok(result) => entity_map(result.parsed),
        Err(e) => {
            failures.push(e);
            entity_map(StageOutput::Json(entities_placeholder()))
        }
    };

    let error = if failures.is_empty() {
        None
    } else {
        Some(
            failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    };

    InterviewResult {
        summary,
        highlights,
        lowlights,
        key_named_entities,
        model: model.to_string(),
        processing_time: round_secs(elapsed),
        success: error.is_none(),
        error,
    }
}

/// Complete fallback record for an interview that could not be processed.
pub fn interview_fallback(
    model: &str,
    error: &ProcessingError,
    elapsed: Duration,
) -> InterviewResult {
    InterviewResult {
        summary: FALLBACK_SUMMARY.to_string(),
        highlights: vec![FALLBACK_HIGHLIGHT.to_string()],
        lowlights: vec![FALLBACK_LOWLIGHT.to_string()],
        key_named_entities: BTreeMap::from([(
            "error".to_string(),
            FALLBACK_ENTITIES.to_string(),
        )]),
        model: model.to_string(),
        processing_time: round_secs(elapsed),
        success: false,
        error: Some(error.to_string()),
    }
}

fn summary_text(output: StageOutput) -> String {
    match output {
        StageOutput::Text(text) if !text.trim().is_empty() => text.trim().to_string(),
        StageOutput::Text(_) => SUMMARY_UNAVAILABLE.to_string(),
        StageOutput::Json(map) => Value::Object(map).to_string(),
    }
}

fn split_highlights(output: StageOutput) -> (Vec<String>, Vec<String>) {
    match output {
        StageOutput::Json(map) => (string_list(map.get("highlights")), string_list(map.get("lowlights"))),
        StageOutput::Text(_) => (
            vec![HIGHLIGHTS_PARSE_FAILURE.to_string()],
            vec![LOWLIGHTS_PARSE_FAILURE.to_string()],
        ),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(render_list_item).collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.trim().to_string()],
        _ => Vec::new(),
    }
}

fn render_list_item(item: &Value) -> Option<String> {
    match item {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn entity_map(output: StageOutput) -> BTreeMap<String, String> {
    match output {
        StageOutput::Json(map) => map
            .into_iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(text) => text,
                    Value::Null => NOT_MENTIONED.to_string(),
                    other => other.to_string(),
                };
                (key, rendered)
            })
            .collect(),
        StageOutput::Text(_) => BTreeMap::from([(
            "error".to_string(),
            ENTITIES_PARSE_FAILURE.to_string(),
        )]),
    }
}

// ---------------------------------------------------------------------------
// Feedback assembly
// ---------------------------------------------------------------------------

/// Build the feedback record after classification and response generation.
///
/// `failures` holds every caught failure; any entry clears `success`.
pub fn assemble_feedback(
    model: &str,
    input: FeedbackInput,
    classification: Classification,
    response: String,
    failures: &[ProcessingError],
    elapsed: Duration,
) -> FeedbackResult {
    let response = if response.trim().is_empty() {
        canned_response(&input.product_name)
    } else {
        response
    };

    let error = if failures.is_empty() {
        None
    } else {
        Some(
            failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    };

    FeedbackResult {
        product_name: input.product_name,
        feedback: input.feedback,
        classification,
        response,
        model: model.to_string(),
        processing_time: round_secs(elapsed),
        success: error.is_none(),
        error,
    }
}

/// Fallback record for feedback that never reached the model.
///
/// Always classified `escalate`.  Validation failures get the apology text;
/// anything else gets the technical-difficulties acknowledgement.
pub fn feedback_fallback(
    model: &str,
    product_name: &str,
    feedback: &str,
    error: &ProcessingError,
    elapsed: Duration,
) -> FeedbackResult {
    let response = if error.is_validation() {
        VALIDATION_APOLOGY.to_string()
    } else {
        technical_difficulties_response(product_name)
    };

    FeedbackResult {
        product_name: product_name.to_string(),
        feedback: feedback.to_string(),
        classification: Classification::Escalate,
        response,
        model: model.to_string(),
        processing_time: round_secs(elapsed),
        success: false,
        error: Some(error.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
