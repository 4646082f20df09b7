//! LLM Backend Abstraction Layer
//!
//! This module normalizes heterogeneous model backends (OpenAI, DeepSeek,
//! Ollama) behind one contract. Every backend implements [`LLMBackend`],
//! which covers two capabilities:
//!
//! - `build_config`: project caller-supplied [`AdapterParams`] into the
//!   backend's immutable [`AdapterConfig`] (defaults, endpoint shape)
//! - `send`: map a message history to the backend's wire payload, attach
//!   auth, perform the call and extract the reply text
//!
//! [`adapter::ModelAdapter`] owns one backend plus a conversation memory and
//! is what agents actually talk to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::secrets::SecretString;
use sdk::errors::EngineError;
use sdk::types::Message;

pub mod adapter;
pub mod deepseek;
pub mod ollama;
pub mod openai;

pub use adapter::ModelAdapter;

/// Default per-request timeout for backend calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while talking to a backend
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Unexpected response format: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for LLMError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LLMError::Timeout
        } else if e.is_connect() {
            LLMError::ProviderUnavailable(e.to_string())
        } else if e.is_decode() {
            LLMError::ParseError(e.to_string())
        } else {
            LLMError::NetworkError(e.to_string())
        }
    }
}

/// Caller-supplied adapter parameters. Every field is optional; the backend
/// fills defaults and validation rejects what is still missing.
#[derive(Debug, Clone, Default)]
pub struct AdapterParams {
    pub model: Option<String>,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

impl AdapterParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Resolved, immutable runtime configuration of one adapter
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Model identifier sent to the backend
    pub model: String,

    /// Credential attached as a bearer token
    pub api_key: SecretString,

    /// Full URL the backend posts to
    pub endpoint: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Output-length cap, when the backend uses one
    pub max_tokens: Option<u32>,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Backend contract implemented once per backend family
#[async_trait]
pub trait LLMBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "openai", "deepseek", "ollama")
    fn name(&self) -> &str;

    /// Model used when the caller does not name one
    fn default_model(&self) -> &str;

    /// Model identifier prefixes this backend accepts
    fn supported_prefixes(&self) -> &[&'static str];

    /// True when the backend cannot work without an explicit endpoint
    /// (self-hosted or local deployments)
    fn requires_endpoint(&self) -> bool;

    /// Project validated parameters into this backend's runtime config
    fn build_config(&self, params: &AdapterParams) -> std::result::Result<AdapterConfig, EngineError>;

    /// Send the conversation and return the reply text.
    ///
    /// An empty string is a valid, well-formed reply; missing fields are a
    /// [`LLMError::ParseError`].
    async fn send(
        &self,
        client: &reqwest::Client,
        config: &AdapterConfig,
        messages: &[Message],
    ) -> Result<String>;
}

/// Backend families selectable from configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAI,
    DeepSeek,
    Ollama,
}

impl BackendKind {
    /// Instantiate the backend for this family
    pub fn create(&self) -> Box<dyn LLMBackend> {
        match self {
            BackendKind::OpenAI => Box::new(openai::OpenAIBackend),
            BackendKind::DeepSeek => Box::new(deepseek::DeepSeekBackend),
            BackendKind::Ollama => Box::new(ollama::OllamaBackend),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAI => "openai",
            BackendKind::DeepSeek => "deepseek",
            BackendKind::Ollama => "ollama",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge the backend's default model into `params` when the caller gave none
pub fn merge_defaults(backend: &dyn LLMBackend, mut params: AdapterParams) -> AdapterParams {
    params.model = params.model.map(|model| model.trim().to_string());
    params.base_url = params.base_url.map(|url| url.trim().to_string());
    if params.model.is_none() {
        params.model = Some(backend.default_model().to_string());
    }
    params
}

/// Check merged parameters against the adapter configuration rules.
///
/// `agent` only labels the credential error.
pub fn validate_params(
    backend: &dyn LLMBackend,
    agent: &str,
    params: &AdapterParams,
) -> std::result::Result<(), EngineError> {
    let model = params
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or(EngineError::MissingModel)?;

    let prefixes = backend.supported_prefixes();
    if !prefixes.iter().any(|prefix| model.starts_with(prefix)) {
        return Err(EngineError::UnsupportedModel {
            model: model.to_string(),
            supported: prefixes.join(", "),
        });
    }

    let has_credential = params
        .api_key
        .as_ref()
        .is_some_and(|key| !key.is_blank());
    if !has_credential {
        return Err(EngineError::MissingCredential(agent.to_string()));
    }

    let has_endpoint = params
        .base_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    if backend.requires_endpoint() && !has_endpoint {
        return Err(EngineError::MissingEndpoint {
            model: model.to_string(),
        });
    }

    if let Some(temperature) = params.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(EngineError::InvalidTemperature(temperature));
        }
    }

    if params.max_tokens == Some(0) {
        return Err(EngineError::InvalidTokenLimit);
    }

    tracing::debug!("LLM config parameters validated for {}", agent);
    Ok(())
}

/// Turn a non-2xx response into the matching error
pub(crate) async fn status_error(backend: &str, response: reqwest::Response) -> LLMError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed(format!("{} ({})", backend, status)),
        429 => LLMError::RateLimitExceeded,
        500..=599 => {
            LLMError::ProviderUnavailable(format!("{} API error ({}): {}", backend, status, text))
        }
        _ => LLMError::InvalidRequest(format!("{} API error ({}): {}", backend, status, text)),
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
///
/// `null` content counts as empty; a missing path is a parse error.
pub(crate) fn chat_completion_content(data: &serde_json::Value) -> Result<String> {
    let message = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| LLMError::ParseError("No message in choices".to_string()))?;

    match message.get("content") {
        Some(serde_json::Value::String(content)) => Ok(content.clone()),
        Some(serde_json::Value::Null) => Ok(String::new()),
        _ => Err(LLMError::ParseError("No content in message".to_string())),
    }
}

/// Chat-completions message shape shared by the OpenAI-compatible backends
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

pub(crate) fn wire_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}
