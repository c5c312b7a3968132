//! Interview transcript validation and cleanup.
//!
//! Lengths are counted in characters (Unicode scalar values), not bytes.
//! Timestamp detection is advisory: a transcript without `HH:MM:SS` /
//! `MM:SS` line prefixes is logged but still processed.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Shortest transcript (after trimming) worth analysing.
pub const MIN_TRANSCRIPT_CHARS: usize = 50;
/// Longest transcript accepted; longer input is rejected, not truncated.
pub const MAX_TRANSCRIPT_CHARS: usize = 50_000;

/// Lines needed before a transcript counts as timestamped.
const MIN_TIMESTAMP_LINES: usize = 2;

static TIMESTAMP_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d{1,2}:\d{2}(:\d{2})?\s+").expect("timestamp pattern is valid")
});

/// A transcript that passed validation, with cleanup statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTranscript {
    text: String,
    raw_lines: usize,
    kept_lines: usize,
    timestamp_lines: usize,
}

impl NormalizedTranscript {
    /// Cleaned transcript: single-spaced, no blank lines, `\n` separated.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Line count of the trimmed input before blank lines were dropped.
    pub fn raw_lines(&self) -> usize {
        self.raw_lines
    }

    pub fn kept_lines(&self) -> usize {
        self.kept_lines
    }

    /// Lines that start with a timestamp such as `00:02:10` or `4:05`.
    pub fn timestamp_lines(&self) -> usize {
        self.timestamp_lines
    }

    /// `false` when the transcript looks untimestamped.
    pub fn has_timestamps(&self) -> bool {
        self.timestamp_lines >= MIN_TIMESTAMP_LINES
    }
}

/// Returns `true` when `line` begins with a timestamp followed by whitespace.
pub fn has_timestamp_prefix(line: &str) -> bool {
    TIMESTAMP_PREFIX.is_match(line)
}

/// Validate and clean a raw interview transcript.
///
/// # Errors
///
/// * [`ValidationError::Missing`] / [`ValidationError::Blank`] for empty input.
/// * [`ValidationError::TooShort`] below [`MIN_TRANSCRIPT_CHARS`].
/// * [`ValidationError::TooLong`] above [`MAX_TRANSCRIPT_CHARS`].
pub fn normalize_transcript(raw: &str) -> Result<NormalizedTranscript, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Missing { field: "transcript" });
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field: "transcript" });
    }

    let length = trimmed.chars().count();
    if length < MIN_TRANSCRIPT_CHARS {
        return Err(ValidationError::TooShort {
            min: MIN_TRANSCRIPT_CHARS,
            actual: length,
        });
    }
    if length > MAX_TRANSCRIPT_CHARS {
        return Err(ValidationError::TooLong {
            max: MAX_TRANSCRIPT_CHARS,
            actual: length,
        });
    }

    let lines: Vec<&str> = trimmed.lines().collect();

    let timestamp_lines = lines
        .iter()
        .filter(|line| has_timestamp_prefix(line))
        .count();
    if timestamp_lines < MIN_TIMESTAMP_LINES {
        log::warn!("Transcript may not contain proper timestamp formatting");
    }

    let kept: Vec<String> = lines
        .iter()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();

    log::info!(
        "Transcript preprocessed: {} lines -> {} lines",
        lines.len(),
        kept.len()
    );

    Ok(NormalizedTranscript {
        text: kept.join("\n"),
        raw_lines: lines.len(),
        kept_lines: kept.len(),
        timestamp_lines,
    })
}
