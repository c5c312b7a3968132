//! Failures a pipeline absorbs and reports in its result's `error` field.

use thiserror::Error;

use crate::input::ValidationError;
use crate::llm::ProviderError;

/// Closed set of failure causes recorded by the pipelines.
///
/// Parse failures are not listed: they are converted to placeholder data at
/// the parser and never reach this level.
#[derive(Debug, Clone, Error)]
pub enum ProcessingError {
    /// Input was rejected before any model call.
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// One stage's model call failed.
    #[error("Processing failed: {stage} stage: {source}")]
    Provider {
        stage: &'static str,
        #[source]
        source: ProviderError,
    },

    /// A stage task died without producing a result.
    #[error("Processing failed: {0}")]
    Internal(String),
}

impl ProcessingError {
    pub fn provider(stage: &'static str, source: ProviderError) -> Self {
        ProcessingError::Provider { stage, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ProcessingError::Validation(_))
    }

    /// The stage involved, when the failure belongs to one.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            ProcessingError::Provider { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
