//! Interview and feedback pipelines.
//!
//! # Architecture
//!
//! ```text
//! InterviewProcessor::process_interview(text)
//!        │
//!        ├─ normalize_transcript                         → Normalizing
//!        ├─ spawn summary / highlights / entities stages → Running
//!        └─ assemble_interview                           → Combining
//!
//! FeedbackProcessor::process_feedback(product, feedback)
//!        │
//!        ├─ normalize_feedback                           → Normalizing
//!        ├─ classification stage                         → Classifying
//!        ├─ ResponseRoute table                          → Routing
//!        └─ response stage + assemble_feedback           → Responding
//! ```
//!
//! Both processors own an `Arc<dyn ModelClient>` and an `Arc` of their stage
//! definitions, so one instance serves any number of concurrent requests.
//! Neither `process_*` call returns an error: failures end up in the
//! record's `success` and `error` fields.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use insight_pipelines::config::AppConfig;
//! use insight_pipelines::pipeline::FeedbackProcessor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let processor = FeedbackProcessor::from_config(&config, None)?;
//!     let result = processor
//!         .process_feedback("TestProduct", "Works perfectly!")
//!         .await;
//!     println!("{} -> {}", result.classification, result.response);
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod classification;
pub mod error;
pub mod feedback;
pub mod interview;
pub mod result;
pub mod state;

pub use classification::{Classification, ResponseRoute};
pub use error::ProcessingError;
pub use feedback::{FeedbackProcessor, FeedbackStages};
pub use interview::{InterviewProcessor, InterviewStageKind, InterviewStages};
pub use result::{FeedbackResult, InterviewResult};
pub use state::{FeedbackState, InterviewState, Outcome, PipelineState, StateTracker};
