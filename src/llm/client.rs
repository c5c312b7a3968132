//! Core `ModelClient` trait and the `OpenRouterClient` implementation.
//!
//! `OpenRouterClient` calls any OpenAI-compatible `/chat/completions`
//! endpoint (OpenRouter by default).  Connection details come from
//! [`LlmConfig`]; the model id, output-token cap and temperature are fixed
//! per client in [`ModelSettings`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::prompt::PromptMessages;

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Errors that can occur during a model call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The provider answered with a non-success status (auth, rate limit …).
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The body carried no `choices[0].message.content` at all.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigurationError
// ---------------------------------------------------------------------------

/// The processor cannot be built at all.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("{env_var} must be configured in environment")]
    MissingApiKey { env_var: String },

    #[error("model name cannot be empty")]
    EmptyModel,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

// ---------------------------------------------------------------------------
// ModelSettings
// ---------------------------------------------------------------------------

/// Per-client generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

// ---------------------------------------------------------------------------
// ModelClient trait
// ---------------------------------------------------------------------------

/// Async interface to the LLM provider.
///
/// Implementors must be `Send + Sync` so a single client can be shared by
/// concurrently running stages behind an `Arc<dyn ModelClient>`.  Calls are
/// stateless; no retry happens at this level.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifier reported in pipeline results.
    fn model(&self) -> &str;

    /// Send one rendered message pair and return the reply text.
    async fn invoke(&self, messages: &PromptMessages) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// OpenRouterClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    settings: ModelSettings,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Build a client, resolving the API key from the environment or config.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingApiKey`] when no key is available; the
    /// check happens here so a misconfigured server fails at startup rather
    /// than on the first request.
    pub fn new(config: &LlmConfig, settings: ModelSettings) -> Result<Self, ConfigurationError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ConfigurationError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            })?;
        Self::with_api_key(config, settings, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(
        config: &LlmConfig,
        settings: ModelSettings,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigurationError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            });
        }
        if settings.model.trim().is_empty() {
            return Err(ConfigurationError::EmptyModel);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            settings,
        })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn request_body(&self, messages: &PromptMessages) -> serde_json::Value {
        serde_json::json!({
            "model":       self.settings.model,
            "messages": [
                { "role": "system", "content": messages.system },
                { "role": "user",   "content": messages.user   }
            ],
            "stream":      false,
            "temperature": self.settings.temperature,
            "max_tokens":  self.settings.max_tokens
        })
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn invoke(&self, messages: &PromptMessages) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        extract_content(&json)
    }
}

/// Pull the first choice's message text out of a chat-completions body.
///
/// Blank content is returned as an empty string; it is model output and the
/// stage parsers decide what it means.
pub fn extract_content(body: &serde_json::Value) -> Result<String, ProviderError> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(ProviderError::EmptyResponse)?;
    Ok(content.trim().to_string())
}

// ---------------------------------------------------------------------------
// MockModelClient (tests only)
// ---------------------------------------------------------------------------

/// Scripted client for unit tests.
///
/// Replies are chosen by the first rule whose marker is contained in the
/// system message; unmatched calls get the default reply.  Every call is
/// recorded.
#[cfg(test)]
pub struct MockModelClient {
    model: String,
    rules: Vec<(String, Result<String, ProviderError>)>,
    default: Result<String, ProviderError>,
    calls: std::sync::Mutex<Vec<PromptMessages>>,
}

#[cfg(test)]
impl MockModelClient {
    pub fn replying(default: &str) -> Self {
        Self {
            model: "test/model".into(),
            rules: Vec::new(),
            default: Ok(default.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            default: Err(error),
            ..Self::replying("")
        }
    }

    pub fn reply_when(mut self, system_marker: &str, reply: &str) -> Self {
        self.rules.push((system_marker.into(), Ok(reply.into())));
        self
    }

    pub fn fail_when(mut self, system_marker: &str, error: ProviderError) -> Self {
        self.rules.push((system_marker.into(), Err(error)));
        self
    }

    pub fn calls(&self) -> Vec<PromptMessages> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelClient for MockModelClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, messages: &PromptMessages) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(messages.clone());
        self.rules
            .iter()
            .find(|(marker, _)| messages.system.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(model: &str) -> ModelSettings {
        ModelSettings {
            model: model.into(),
            max_tokens: 512,
            temperature: 0.3,
        }
    }

    #[test]
    fn builds_with_explicit_key() {
        let client =
            OpenRouterClient::with_api_key(&LlmConfig::default(), settings("m/x"), "sk-test")
                .expect("client");
        assert_eq!(client.model(), "m/x");
        assert_eq!(client.settings().max_tokens, 512);
    }

    #[test]
    fn blank_key_is_a_configuration_error() {
        let err = OpenRouterClient::with_api_key(&LlmConfig::default(), settings("m/x"), "  ")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPENROUTER_API_KEY must be configured in environment"
        );
    }

    #[test]
    fn missing_key_fails_at_construction() {
        let mut config = LlmConfig::default();
        config.api_key_env = "INSIGHT_PIPELINES_TEST_UNSET_KEY".into();
        config.api_key = None;

        let err = OpenRouterClient::new(&config, settings("m/x")).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingApiKey { env_var } if env_var == "INSIGHT_PIPELINES_TEST_UNSET_KEY"));
    }

    #[test]
    fn stored_key_is_enough() {
        let mut config = LlmConfig::default();
        config.api_key_env = "INSIGHT_PIPELINES_TEST_UNSET_KEY".into();
        config.api_key = Some("sk-stored".into());

        assert!(OpenRouterClient::new(&config, settings("m/x")).is_ok());
    }

    #[test]
    fn empty_model_is_rejected() {
        let err =
            OpenRouterClient::with_api_key(&LlmConfig::default(), settings(" "), "sk").unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyModel));
    }

    #[test]
    fn request_body_carries_settings() {
        let client =
            OpenRouterClient::with_api_key(&LlmConfig::default(), settings("m/x"), "sk").unwrap();
        let body = client.request_body(&PromptMessages {
            system: "S".into(),
            user: "U".into(),
        });

        assert_eq!(body["model"], "m/x");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "S");
        assert_eq!(body["messages"][1]["content"], "U");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn extracts_first_choice() {
        let body = json!({ "choices": [ { "message": { "content": "  positive \n" } } ] });
        assert_eq!(extract_content(&body).unwrap(), "positive");
    }

    #[test]
    fn blank_content_is_an_empty_reply() {
        let empty = json!({ "choices": [ { "message": { "content": "   " } } ] });
        assert_eq!(extract_content(&empty).unwrap(), "");

        let bare = json!({ "choices": [ { "message": { "content": "" } } ] });
        assert_eq!(extract_content(&bare).unwrap(), "");
    }

    #[test]
    fn missing_content_is_an_error() {
        let null_content = json!({ "choices": [ { "message": { "content": null } } ] });
        assert!(matches!(
            extract_content(&null_content),
            Err(ProviderError::EmptyResponse)
        ));

        let missing = json!({ "error": { "message": "rate limited" } });
        assert!(matches!(
            extract_content(&missing),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn client_is_object_safe() {
        let client =
            OpenRouterClient::with_api_key(&LlmConfig::default(), settings("m/x"), "sk").unwrap();
        let boxed: Box<dyn ModelClient> = Box::new(client);
        drop(boxed);
    }

    #[tokio::test]
    async fn mock_routes_by_system_marker() {
        let mock = MockModelClient::replying("default")
            .reply_when("Classify", "neutral")
            .fail_when("escalation", ProviderError::Timeout);

        let classify = PromptMessages {
            system: "Classify this".into(),
            user: "u".into(),
        };
        let escalate = PromptMessages {
            system: "brief escalation response".into(),
            user: "u".into(),
        };
        let other = PromptMessages {
            system: "anything".into(),
            user: "u".into(),
        };

        assert_eq!(mock.invoke(&classify).await.unwrap(), "neutral");
        assert!(matches!(
            mock.invoke(&escalate).await,
            Err(ProviderError::Timeout)
        ));
        assert_eq!(mock.invoke(&other).await.unwrap(), "default");
        assert_eq!(mock.calls().len(), 3);
    }
}
