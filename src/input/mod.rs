//! Input normalisation for both pipelines.
//!
//! * [`normalize_transcript`]: strict bounds check plus whitespace cleanup;
//!   overlong transcripts are rejected.
//! * [`normalize_feedback`]: emptiness check plus silent truncation of the
//!   product name and feedback text.
//!
//! Both return a [`ValidationError`] describing the first problem found.

pub mod feedback;
pub mod transcript;

use thiserror::Error;

pub use feedback::{
    clip_feedback, normalize_feedback, FeedbackInput, MAX_FEEDBACK_CHARS, MAX_PRODUCT_NAME_CHARS,
};
pub use transcript::{
    normalize_transcript, NormalizedTranscript, MAX_TRANSCRIPT_CHARS, MIN_TRANSCRIPT_CHARS,
};

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Caller input that cannot enter a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The field was empty before any cleanup.
    #[error("{field} must be a non-empty string")]
    Missing { field: &'static str },

    /// The field held only whitespace.
    #[error("{field} cannot be empty after trimming")]
    Blank { field: &'static str },

    #[error("transcript must be at least {min} characters long")]
    TooShort { min: usize, actual: usize },

    #[error("transcript must be less than {} characters", group_thousands(*.max))]
    TooLong { max: usize, actual: usize },
}

/// Render `50000` as `50,000`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
