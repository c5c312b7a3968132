//! Product feedback pipeline.
//!
//! # Flow
//!
//! ```text
//! (product_name, feedback)
//!   └─▶ normalize_feedback                         [Normalizing]
//!         ├─ Err → feedback_fallback (apology)     [Done(fallback)]
//!         └─ Ok  → classification stage            [Classifying]
//!                    ├─ Ok  → Classification::coerce
//!                    └─ Err → escalate (recorded)
//!                  ResponseRoute::from(tag)        [Routing]
//!                  response stage for the route    [Responding]
//!                    ├─ Ok  → reply
//!                    └─ Err → canned_response (recorded)
//!                  assemble_feedback               [Done(success | degraded)]
//! ```
//!
//! [`FeedbackProcessor::process_feedback`] runs this on a spawned task; a
//! task that dies yields the technical-difficulties fallback record.
//!
//! Fully sequential: one model call to classify, one to reply.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::input::{clip_feedback, normalize_feedback, FeedbackInput};
use crate::llm::prompt::{
    CLASSIFICATION_SYSTEM, CLASSIFICATION_USER, ESCALATION_SYSTEM, FALLBACK_SYSTEM,
    NEGATIVE_SYSTEM, NEUTRAL_SYSTEM, POSITIVE_SYSTEM, RESPONSE_USER,
};
use crate::llm::{
    ConfigurationError, ModelClient, ModelSettings, OpenRouterClient, OutputParser,
    PipelineRequest, PromptTemplate, Stage, StageResult,
};

use super::assemble::{assemble_feedback, canned_response, feedback_fallback};
use super::classification::{Classification, ResponseRoute};
use super::error::ProcessingError;
use super::result::FeedbackResult;
use super::state::{FeedbackState, Outcome, StateTracker};

const CLASSIFICATION_STAGE: &str = "classification";

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Classification stage plus one response stage per [`ResponseRoute`].
#[derive(Debug)]
pub struct FeedbackStages {
    classification: Stage,
    positive: Stage,
    negative: Stage,
    neutral: Stage,
    escalation: Stage,
    fallback: Stage,
}

impl FeedbackStages {
    pub fn new() -> Self {
        let response = |route: ResponseRoute, system: &'static str| {
            Stage::new(
                route.stage_name(),
                PromptTemplate::new(system, RESPONSE_USER),
                OutputParser::Passthrough,
            )
        };

        Self {
            classification: Stage::new(
                CLASSIFICATION_STAGE,
                PromptTemplate::new(CLASSIFICATION_SYSTEM, CLASSIFICATION_USER),
                OutputParser::Passthrough,
            ),
            positive: response(ResponseRoute::Positive, POSITIVE_SYSTEM),
            negative: response(ResponseRoute::Negative, NEGATIVE_SYSTEM),
            neutral: response(ResponseRoute::Neutral, NEUTRAL_SYSTEM),
            escalation: response(ResponseRoute::Escalate, ESCALATION_SYSTEM),
            fallback: response(ResponseRoute::Fallback, FALLBACK_SYSTEM),
        }
    }

    pub fn classification(&self) -> &Stage {
        &self.classification
    }

    pub fn response(&self, route: ResponseRoute) -> &Stage {
        match route {
            ResponseRoute::Positive => &self.positive,
            ResponseRoute::Negative => &self.negative,
            ResponseRoute::Neutral => &self.neutral,
            ResponseRoute::Escalate => &self.escalation,
            ResponseRoute::Fallback => &self.fallback,
        }
    }
}

impl Default for FeedbackStages {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FeedbackProcessor
// ---------------------------------------------------------------------------

/// Runs the feedback pipeline.  Cheap to clone.
#[derive(Clone)]
pub struct FeedbackProcessor {
    client: Arc<dyn ModelClient>,
    stages: Arc<FeedbackStages>,
}

impl std::fmt::Debug for FeedbackProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackProcessor")
            .field("model", &self.client.model())
            .finish_non_exhaustive()
    }
}

impl FeedbackProcessor {
    /// Build a processor backed by [`OpenRouterClient`].
    ///
    /// # Errors
    ///
    /// [`ConfigurationError`] when no API key is configured or the model id is
    /// empty.
    pub fn from_config(config: &AppConfig, model: Option<&str>) -> Result<Self, ConfigurationError> {
        let settings = ModelSettings {
            model: model
                .map(str::to_string)
                .unwrap_or_else(|| config.llm.default_model.clone()),
            max_tokens: config.feedback.max_tokens,
            temperature: config.feedback.temperature,
        };
        let client = OpenRouterClient::new(&config.llm, settings)?;
        log::info!("feedback processor ready (model: {})", client.model());
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            stages: Arc::new(FeedbackStages::new()),
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Classify one submission and write the reply.  Never fails; the
    /// returned `response` is always non-empty.
    ///
    /// The pipeline runs on its own task; if that task dies the caller still
    /// gets a fallback record.
    pub async fn process_feedback(&self, product_name: &str, feedback: &str) -> FeedbackResult {
        let started = Instant::now();
        let processor = self.clone();
        let (product, text) = (product_name.to_string(), feedback.to_string());
        let task = tokio::spawn(async move { processor.run(&product, &text).await.0 });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let error = ProcessingError::Internal(format!("feedback task died: {e}"));
                log::error!("feedback: {error}");
                let echoed = clip_feedback(product_name, feedback);
                feedback_fallback(
                    self.model(),
                    &echoed.product_name,
                    &echoed.feedback,
                    &error,
                    started.elapsed(),
                )
            }
        }
    }

    /// Run the classification stage alone.
    ///
    /// # Errors
    ///
    /// Validation or provider failures; an unrecognised tag is coerced, not
    /// reported.
    pub async fn classify_feedback(
        &self,
        product_name: &str,
        feedback: &str,
    ) -> Result<Classification, ProcessingError> {
        let input = normalize_feedback(product_name, feedback)?;
        let result = self
            .stages
            .classification()
            .run(self.client.as_ref(), &classification_request(&input))
            .await
            .map_err(|e| ProcessingError::provider(CLASSIFICATION_STAGE, e))?;
        Ok(Classification::coerce(&stage_text(result)))
    }

    /// Run the response stage for `tag` alone.  Tags outside the four known
    /// classifications go to the fallback stage.
    ///
    /// # Errors
    ///
    /// Validation or provider failures.
    pub async fn generate_response(
        &self,
        product_name: &str,
        feedback: &str,
        tag: &str,
    ) -> Result<String, ProcessingError> {
        let input = normalize_feedback(product_name, feedback)?;
        let route = ResponseRoute::for_tag(tag);
        let stage = self.stages.response(route);
        let result = stage
            .run(
                self.client.as_ref(),
                &response_request(&input, tag.trim()),
            )
            .await
            .map_err(|e| ProcessingError::provider(stage.name(), e))?;

        let reply = stage_text(result);
        if reply.is_empty() {
            return Ok(canned_response(&input.product_name));
        }
        Ok(reply)
    }

    pub(crate) async fn run(
        &self,
        product_name: &str,
        feedback: &str,
    ) -> (FeedbackResult, Vec<FeedbackState>) {
        let started = Instant::now();
        let mut tracker = StateTracker::<FeedbackState>::new("feedback");

        tracker.advance(FeedbackState::Normalizing);
        let input = match normalize_feedback(product_name, feedback) {
            Ok(input) => input,
            Err(e) => {
                let error = ProcessingError::from(e);
                log::error!("feedback: {error}");
                tracker.advance(FeedbackState::Done(Outcome::Fallback));
                let echoed = clip_feedback(product_name, feedback);
                let result = feedback_fallback(
                    self.model(),
                    &echoed.product_name,
                    &echoed.feedback,
                    &error,
                    started.elapsed(),
                );
                return (result, tracker.into_history());
            }
        };

        let mut failures = Vec::new();

        tracker.advance(FeedbackState::Classifying);
        let classification = match self
            .stages
            .classification()
            .run(self.client.as_ref(), &classification_request(&input))
            .await
        {
            Ok(result) => Classification::coerce(&stage_text(result)),
            Err(e) => {
                log::warn!("feedback: classification failed ({e}), escalating");
                failures.push(ProcessingError::provider(CLASSIFICATION_STAGE, e));
                Classification::Escalate
            }
        };

        tracker.advance(FeedbackState::Routing);
        let route = ResponseRoute::from(classification);
        let stage = self.stages.response(route);
        log::debug!("feedback: {classification} -> {}", stage.name());

        tracker.advance(FeedbackState::Responding);
        let response = match stage
            .run(
                self.client.as_ref(),
                &response_request(&input, classification.as_str()),
            )
            .await
        {
            Ok(result) => stage_text(result),
            Err(e) => {
                log::warn!("feedback: {} failed ({e}), using canned reply", stage.name());
                failures.push(ProcessingError::provider(stage.name(), e));
                String::new()
            }
        };

        let result = assemble_feedback(
            self.model(),
            input,
            classification,
            response,
            &failures,
            started.elapsed(),
        );
        log::info!(
            "feedback: classified {} in {:.3}s (success: {})",
            result.classification,
            result.processing_time,
            result.success
        );
        tracker.advance(FeedbackState::Done(Outcome::merged(result.success)));
        (result, tracker.into_history())
    }
}

fn classification_request(input: &FeedbackInput) -> PipelineRequest {
    PipelineRequest::new()
        .with("product_name", input.product_name.as_str())
        .with("feedback", input.feedback.as_str())
}

fn response_request(input: &FeedbackInput, classification: &str) -> PipelineRequest {
    classification_request(input).with("classification", classification)
}

fn stage_text(result: StageResult) -> String {
    result
        .parsed
        .as_text()
        .map(str::to_string)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
