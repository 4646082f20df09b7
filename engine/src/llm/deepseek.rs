//! DeepSeek backend
//!
//! DeepSeek coder models are usually served from a self-hosted,
//! OpenAI-compatible server, so the endpoint is mandatory and is used as the
//! complete chat-completions URL (e.g. `http://localhost:11434/v1/chat/completions`).
//! No output-length cap is sent.

use async_trait::async_trait;
use serde::Serialize;

use super::{
    chat_completion_content, status_error, wire_messages, AdapterConfig, AdapterParams,
    LLMBackend, Result, WireMessage, DEFAULT_TIMEOUT,
};
use sdk::errors::EngineError;
use sdk::types::Message;

pub const DEFAULT_MODEL: &str = "deepseek-coder";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

const SUPPORTED_PREFIXES: &[&str] = &["deepseek"];

pub struct DeepSeekBackend;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
}

#[async_trait]
impl LLMBackend for DeepSeekBackend {
    fn name(&self) -> &str {
        "deepseek"
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
        let endpoint = params
            .base_url
            .clone()
            .ok_or_else(|| EngineError::MissingEndpoint {
                model: model.clone(),
            })?;

        Ok(AdapterConfig {
            model,
            api_key: params
                .api_key
                .clone()
                .ok_or_else(|| EngineError::MissingCredential(self.name().to_string()))?,
            endpoint,
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: None,
            timeout: params.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        config: &AdapterConfig,
        messages: &[Message],
    ) -> Result<String> {
        let payload = ChatRequest {
            model: &config.model,
            temperature: config.temperature,
            messages: wire_messages(messages),
        };

        tracing::debug!(
            "DeepSeek request: model={}, messages={}",
            config.model,
            messages.len()
        );

        let response = client
            .post(&config.endpoint)
            .bearer_auth(config.api_key.unsecure())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(self.name(), response).await);
        }

        let data: serde_json::Value = response.json().await?;
        let content = chat_completion_content(&data)?;

        Ok(content.trim().to_string())
    }
}
