//! OpenAI chat-completions backend
//!
//! Hosted backend: the endpoint is optional and defaults to the public API.
//! Replies are capped with `max_tokens` (150 unless configured).

use async_trait::async_trait;
use serde::Serialize;

use super::{
    chat_completion_content, status_error, wire_messages, AdapterConfig, AdapterParams,
    LLMBackend, Result, WireMessage, DEFAULT_TIMEOUT,
};
use sdk::errors::EngineError;
use sdk::types::Message;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 150;

const SUPPORTED_PREFIXES: &[&str] = &["gpt-3.5-turbo", "gpt-4", "o1", "o3"];

pub struct OpenAIBackend;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[async_trait]
impl LLMBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn supported_prefixes(&self) -> &[&'static str] {
        SUPPORTED_PREFIXES
    }

    fn requires_endpoint(&self) -> bool {
        false
    }

    fn build_config(&self, params: &AdapterParams) -> std::result::Result<AdapterConfig, EngineError> {
        let base_url = params
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        Ok(AdapterConfig {
            model: params.model.clone().ok_or(EngineError::MissingModel)?,
            api_key: params
                .api_key
                .clone()
                .ok_or_else(|| EngineError::MissingCredential(self.name().to_string()))?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: Some(params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
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
            messages: wire_messages(messages),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        tracing::debug!(
            "OpenAI request: model={}, messages={}",
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
        chat_completion_content(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_build_config_defaults() {
        let params = AdapterParams::new()
            .with_model("gpt-4")
            .with_api_key("sk-test");
        let config = OpenAIBackend.build_config(&params).unwrap();

        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_openai_build_config_overrides() {
        let params = AdapterParams::new()
            .with_model("gpt-4o")
            .with_api_key("sk-test")
            .with_base_url("http://proxy.local/v1/")
            .with_temperature(0.1)
            .with_max_tokens(512);
        let config = OpenAIBackend.build_config(&params).unwrap();

        assert_eq!(config.endpoint, "http://proxy.local/v1/chat/completions");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, Some(512));
    }

    #[test]
    fn test_openai_request_shape() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let request = ChatRequest {
            model: "gpt-4",
            messages: wire_messages(&messages),
            temperature: 0.7,
            max_tokens: Some(150),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
