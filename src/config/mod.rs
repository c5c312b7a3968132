//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), the provider and sampling
//! sub-configs, `AppPaths` for the platform config directory, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, GenerationConfig, LlmConfig, DEFAULT_API_KEY_ENV, DEFAULT_MODEL, KNOWN_MODELS,
};
