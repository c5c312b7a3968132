//! Interview analysis pipeline.
//!
//! # Flow
//!
//! ```text
//! transcript
//!   └─▶ normalize_transcript                       [Normalizing]
//!         ├─ Err → interview_fallback              [Done(fallback)]
//!         └─ Ok  → tokio::spawn × 3                [Running]
//!                    ├─ summary     (text)
//!                    ├─ highlights  (JSON)
//!                    └─ entities    (JSON)
//!                  tokio::join! → assemble_interview [Combining]
//!                                                  [Done(success | degraded)]
//! ```
//!
//! A failing stage never aborts its siblings: every task is awaited and a
//! failure is replaced by that stage's placeholder.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::{JoinError, JoinHandle};

use crate::config::AppConfig;
use crate::input::normalize_transcript;
use crate::llm::prompt::{
    ENTITIES_SYSTEM, HIGHLIGHTS_SYSTEM, JSON_EXTRACTION_USER, SUMMARY_SYSTEM, SUMMARY_USER,
};
use crate::llm::{
    ConfigurationError, ModelClient, ModelSettings, OpenRouterClient, OutputParser,
    PipelineRequest, PromptTemplate, ProviderError, Stage, StageResult,
};

use super::assemble::{
    assemble_interview, entities_placeholder, highlights_placeholder, interview_fallback,
    InterviewStageOutcomes,
};
use super::error::ProcessingError;
use super::result::InterviewResult;
use super::state::{InterviewState, Outcome, StateTracker};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The three analysis stages, built once per processor.
#[derive(Debug)]
pub struct InterviewStages {
    summary: Stage,
    highlights: Stage,
    entities: Stage,
}

impl InterviewStages {
    pub fn new() -> Self {
        Self {
            summary: Stage::new(
                InterviewStageKind::Summary.name(),
                PromptTemplate::new(SUMMARY_SYSTEM, SUMMARY_USER),
                OutputParser::Passthrough,
            ),
            highlights: Stage::new(
                InterviewStageKind::Highlights.name(),
                PromptTemplate::new(HIGHLIGHTS_SYSTEM, JSON_EXTRACTION_USER),
                OutputParser::json(highlights_placeholder()),
            ),
            entities: Stage::new(
                InterviewStageKind::Entities.name(),
                PromptTemplate::new(ENTITIES_SYSTEM, JSON_EXTRACTION_USER),
                OutputParser::json(entities_placeholder()),
            ),
        }
    }

    pub fn get(&self, kind: InterviewStageKind) -> &Stage {
        match kind {
            InterviewStageKind::Summary => &self.summary,
            InterviewStageKind::Highlights => &self.highlights,
            InterviewStageKind::Entities => &self.entities,
        }
    }
}

impl Default for InterviewStages {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStageKind {
    Summary,
    Highlights,
    Entities,
}

impl InterviewStageKind {
    pub fn name(&self) -> &'static str {
        match self {
            InterviewStageKind::Summary => "summary",
            InterviewStageKind::Highlights => "highlights",
            InterviewStageKind::Entities => "entities",
        }
    }
}

type StageHandle = JoinHandle<Result<StageResult, ProviderError>>;

// ---------------------------------------------------------------------------
// InterviewProcessor
// ---------------------------------------------------------------------------

/// Runs the interview pipeline.  Cheap to clone; clones share the client and
/// the stage definitions.
#[derive(Clone)]
pub struct InterviewProcessor {
    client: Arc<dyn ModelClient>,
    stages: Arc<InterviewStages>,
}

impl std::fmt::Debug for InterviewProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewProcessor")
            .field("model", &self.client.model())
            .finish_non_exhaustive()
    }
}

impl InterviewProcessor {
    /// Build a processor backed by [`OpenRouterClient`].
    ///
    /// `model` overrides `config.llm.default_model`.
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
            max_tokens: config.interview.max_tokens,
            temperature: config.interview.temperature,
        };
        let client = OpenRouterClient::new(&config.llm, settings)?;
        log::info!("interview processor ready (model: {})", client.model());
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            stages: Arc::new(InterviewStages::new()),
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Analyse one transcript.  Never fails; problems are reported through
    /// `success` and `error` on the returned record.
    pub async fn process_interview(&self, transcript: &str) -> InterviewResult {
        self.run(transcript).await.0
    }

    /// Like [`process_interview`](Self::process_interview) but also returns
    /// the states visited.
    pub(crate) async fn run(&self, transcript: &str) -> (InterviewResult, Vec<InterviewState>) {
        let started = Instant::now();
        let mut tracker = StateTracker::<InterviewState>::new("interview");

        tracker.advance(InterviewState::Normalizing);
        let normalized = match normalize_transcript(transcript) {
            Ok(normalized) => normalized,
            Err(e) => {
                let error = ProcessingError::from(e);
                log::error!("interview: {error}");
                tracker.advance(InterviewState::Done(Outcome::Fallback));
                let result = interview_fallback(self.model(), &error, started.elapsed());
                return (result, tracker.into_history());
            }
        };

        tracker.advance(InterviewState::Running);
        let request = Arc::new(PipelineRequest::new().with("transcript", normalized.into_text()));

        let summary = self.spawn_stage(InterviewStageKind::Summary, &request);
        let highlights = self.spawn_stage(InterviewStageKind::Highlights, &request);
        let entities = self.spawn_stage(InterviewStageKind::Entities, &request);
        let (summary, highlights, entities) = tokio::join!(summary, highlights, entities);

        tracker.advance(InterviewState::Combining);
        let outcomes = InterviewStageOutcomes {
            summary: settle(InterviewStageKind::Summary, summary),
            highlights: settle(InterviewStageKind::Highlights, highlights),
            entities: settle(InterviewStageKind::Entities, entities),
        };
        let result = assemble_interview(self.model(), outcomes, started.elapsed());

        log::info!(
            "interview: done in {:.3}s (success: {})",
            result.processing_time,
            result.success
        );
        tracker.advance(InterviewState::Done(Outcome::merged(result.success)));
        (result, tracker.into_history())
    }

    fn spawn_stage(&self, kind: InterviewStageKind, request: &Arc<PipelineRequest>) -> StageHandle {
        let client = Arc::clone(&self.client);
        let stages = Arc::clone(&self.stages);
        let request = Arc::clone(request);
        tokio::spawn(async move { stages.get(kind).run(client.as_ref(), &request).await })
    }
}

/// Fold a joined stage task into the assembler's input.
fn settle(
    kind: InterviewStageKind,
    joined: Result<Result<StageResult, ProviderError>, JoinError>,
) -> Result<StageResult, ProcessingError> {
    match joined {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => {
            log::warn!("interview: {} stage failed: {e}", kind.name());
            Err(ProcessingError::provider(kind.name(), e))
        }
        Err(e) => {
            log::error!("interview: {} stage task died: {e}", kind.name());
            Err(ProcessingError::Internal(format!(
                "{} stage task died: {e}",
                kind.name()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
