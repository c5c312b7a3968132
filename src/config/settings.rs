//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Sections missing from `settings.toml` fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Model used when neither the caller nor the config names one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Environment variable consulted for the provider credential.
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// A few well-known model identifiers accepted by OpenRouter.
pub const KNOWN_MODELS: &[&str] = &[
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3-haiku",
    "openai/gpt-4-turbo",
    "openai/gpt-3.5-turbo",
    "meta-llama/llama-3.1-8b-instruct",
    "google/gemini-pro",
];

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection settings for the LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API, without the
    /// `/chat/completions` suffix.
    pub base_url: String,
    /// API key stored in the settings file.  The environment variable named
    /// by `api_key_env` takes precedence when set.
    pub api_key: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier used when a request does not name one.
    pub default_model: String,
    /// Maximum seconds to wait for a provider response.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            default_model: DEFAULT_MODEL.into(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the process environment, falling back to the
    /// stored `api_key`.  Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with an explicit
    /// variable lookup (useful for tests).
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
            })
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Sampling settings applied to every model call of one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on tokens the provider may generate per call.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
}

impl GenerationConfig {
    /// Interview analysis needs room for a 150–300 word summary.
    pub fn interview() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    /// Feedback replies are kept short.
    pub fn feedback() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use insight_pipelines::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.feedback.max_tokens, 512);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider connection settings.
    pub llm: LlmConfig,
    /// Sampling settings for the interview pipeline.
    pub interview: GenerationConfig,
    /// Sampling settings for the feedback pipeline.
    pub feedback: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            interview: GenerationConfig::interview(),
            feedback: GenerationConfig::feedback(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file named on the command line, or the platform default.
    ///
    /// An explicit path must load.  A broken platform file only logs a
    /// warning and yields the defaults.
    pub fn load_or_default(explicit: Option<&std::path::Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config ({e}); using defaults");
                Self::default()
            })),
        }
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
