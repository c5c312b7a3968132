//! LLM-backed analysis of interview transcripts and product feedback.
//!
//! * [`config`]: `settings.toml` loading and provider settings.
//! * [`input`]: validation and cleanup of caller input.
//! * [`llm`]: model client, prompt templates, output parsers, stages.
//! * [`pipeline`]: the interview and feedback processors.

pub mod config;
pub mod input;
pub mod llm;
pub mod pipeline;
