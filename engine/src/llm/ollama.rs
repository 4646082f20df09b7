//! Ollama Backend
//!
//! This module implements the LLMBackend trait for Ollama's native chat API.
//! Ollama runs models locally, typically at http://localhost:11434, so the
//! endpoint is mandatory and `/api/chat` is appended to it.
//!
//! Ollama itself ignores credentials, but a reverse proxy in front of it may
//! not; the configured key is sent as a bearer token like every other backend
//! (any placeholder such as "ollama" works for a bare install).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    status_error, AdapterConfig, AdapterParams, LLMBackend, LLMError, Result, DEFAULT_TIMEOUT,
};
use sdk::errors::EngineError;
use sdk::types::Message;

pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

const SUPPORTED_PREFIXES: &[&str] = &[
    "ollama",
    "local",
    "llama",
    "deepseek",
    "qwen",
    "mistral",
    "codellama",
    "phi",
    "gemma",
];

pub struct OllamaBackend;

impl OllamaBackend {
    /// Convert our Message format to Ollama's format
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LLMBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn supported_prefixes(&self) -> &[&'static str] {
        SUPPORTED_PREFIXES
    }

    fn requires_endpoint(&self) -> bool {
        true
    }

    fn build_config(&self, params: &AdapterParams) -> std::result::Result<AdapterConfig, EngineError> {
        let model = params.model.clone().ok_or(EngineError::MissingModel)?;
        let base_url = params
            .base_url
            .as_deref()
            .ok_or_else(|| EngineError::MissingEndpoint {
                model: model.clone(),
            })?;

        Ok(AdapterConfig {
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model,
            api_key: params
                .api_key
                .clone()
                .ok_or_else(|| EngineError::MissingCredential(self.name().to_string()))?,
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: params.max_tokens,
            timeout: params.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        config: &AdapterConfig,
        messages: &[Message],
    ) -> Result<String> {
        let ollama_messages = Self::convert_messages(messages);

        tracing::debug!(
            "Ollama request: model={}, messages={}, total_chars={}",
            config.model,
            ollama_messages.len(),
            ollama_messages
                .iter()
                .map(|m| m.content.len())
                .sum::<usize>()
        );

        let request = OllamaRequest {
            model: config.model.clone(),
            messages: ollama_messages,
            stream: false,
            options: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        };

        let start = std::time::Instant::now();
        let response = client
            .post(&config.endpoint)
            .bearer_auth(config.api_key.unsecure())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        config.endpoint
                    ))
                } else {
                    LLMError::from(e)
                }
            })?;

        tracing::info!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            return Err(status_error(self.name(), response).await);
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(ollama_response.message.content.unwrap_or_default())
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama message format
#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaReply,
}

/// Reply message; `content` may be null or missing
#[derive(Debug, Deserialize)]
struct OllamaReply {
    #[serde(default)]
    content: Option<String>,
}
