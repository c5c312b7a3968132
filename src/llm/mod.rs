//! LLM building blocks shared by both pipelines.
//!
//! This module provides:
//! * [`ModelClient`]: async trait implemented by provider clients.
//! * [`OpenRouterClient`]: OpenAI-compatible REST client.
//! * [`PromptTemplate`] / [`PipelineRequest`]: instruction templates and the
//!   fields they are rendered with.
//! * [`OutputParser`]: passthrough and structured-JSON parsing.
//! * [`Stage`]: template + model call + parser as one unit.
//! * [`ProviderError`] / [`ConfigurationError`] / [`ParseError`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use insight_pipelines::config::AppConfig;
//! use insight_pipelines::llm::{
//!     ModelSettings, OpenRouterClient, OutputParser, PipelineRequest, PromptTemplate, Stage,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = OpenRouterClient::new(
//!         &config.llm,
//!         ModelSettings {
//!             model: config.llm.default_model.clone(),
//!             max_tokens: 256,
//!             temperature: 0.3,
//!         },
//!     )
//!     .expect("OPENROUTER_API_KEY must be set");
//!
//!     let stage = Stage::new(
//!         "echo",
//!         PromptTemplate::new("Repeat the text.", "{text}"),
//!         OutputParser::Passthrough,
//!     );
//!     let request = PipelineRequest::new().with("text", "hello");
//!     let result = stage.run(&client, &request).await.unwrap();
//!     println!("{:?}", result.parsed);
//! }
//! ```

pub mod client;
pub mod parser;
pub mod prompt;
pub mod stage;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{
    extract_content, ConfigurationError, ModelClient, ModelSettings, OpenRouterClient,
    ProviderError,
};
pub use parser::{parse_json_object, OutputParser, ParseError, StageOutput};
pub use prompt::{PipelineRequest, PromptMessages, PromptTemplate};
pub use stage::{Stage, StageResult};

// test-only re-export so pipeline tests can script model replies.
#[cfg(test)]
pub use client::MockModelClient;
