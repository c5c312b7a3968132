//! Product feedback validation and truncation.
//!
//! Unlike transcripts, overlong feedback is cut to size without error.

use super::ValidationError;

pub const MAX_PRODUCT_NAME_CHARS: usize = 50;
pub const MAX_FEEDBACK_CHARS: usize = 300;

/// Trimmed and truncated feedback ready for the classification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackInput {
    pub product_name: String,
    pub feedback: String,
}

/// Validate, trim and truncate a feedback submission.
///
/// # Errors
///
/// [`ValidationError::Missing`] when either field is empty, and
/// [`ValidationError::Blank`] when either is whitespace only.
pub fn normalize_feedback(
    product_name: &str,
    feedback: &str,
) -> Result<FeedbackInput, ValidationError> {
    if product_name.is_empty() {
        return Err(ValidationError::Missing {
            field: "product_name",
        });
    }
    if feedback.is_empty() {
        return Err(ValidationError::Missing { field: "feedback" });
    }

    let FeedbackInput {
        product_name,
        feedback,
    } = clip_feedback(product_name, feedback);

    if product_name.is_empty() {
        return Err(ValidationError::Blank {
            field: "product_name",
        });
    }
    if feedback.is_empty() {
        return Err(ValidationError::Blank { field: "feedback" });
    }

    Ok(FeedbackInput {
        product_name,
        feedback,
    })
}

/// Trim and truncate both fields without validating them.
pub fn clip_feedback(product_name: &str, feedback: &str) -> FeedbackInput {
    FeedbackInput {
        product_name: truncate_chars(product_name.trim(), MAX_PRODUCT_NAME_CHARS),
        feedback: truncate_chars(feedback.trim(), MAX_FEEDBACK_CHARS),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
