//! Model Adapter
//!
//! A `ModelAdapter` binds one backend to one conversation. Construction
//! merges defaults, validates, projects the backend config and seeds memory
//! with the system prompt; any failure returns `Err` and no adapter exists.
//!
//! `generate` never fails: backend errors come back as
//! [`Generation::Failed`] so a pipeline can keep going.

use std::fmt;

use tracing::{debug, error, info, warn};

use super::{merge_defaults, validate_params, AdapterConfig, AdapterParams, LLMBackend};
use crate::agent::memory::ConversationMemory;
use crate::secrets::scrub_secrets;
use sdk::errors::EngineError;
use sdk::types::{Generation, Message};

/// Placeholder recorded when a backend answers with empty content
pub const EMPTY_REPLY_NOTE: &str = "No content returned by the model.";

/// One backend plus its private conversation memory
pub struct ModelAdapter {
    name: String,
    config: AdapterConfig,
    memory: ConversationMemory,
    backend: Box<dyn LLMBackend>,
    client: reqwest::Client,
}

impl ModelAdapter {
    /// Build a ready-to-use adapter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the model is missing or not
    /// supported by `backend`, the credential is missing, or the backend
    /// needs an endpoint that was not given.
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        params: AdapterParams,
        backend: Box<dyn LLMBackend>,
        max_history: usize,
    ) -> Result<Self, EngineError> {
        let name = name.into();

        let params = merge_defaults(backend.as_ref(), params);
        validate_params(backend.as_ref(), &name, &params)?;
        let config = backend.build_config(&params)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::HttpClient(e.to_string()))?;

        let mut memory = ConversationMemory::with_max_history(max_history);
        memory.push(Message::system(system_message));

        debug!(
            "Created adapter: name={}, backend={}, model={}",
            name,
            backend.name(),
            config.model
        );

        Ok(Self {
            name,
            config,
            memory,
            backend,
            client,
        })
    }

    /// Send `instructions` with the bounded conversation history.
    ///
    /// Memory effects:
    /// - success: user turn and assistant reply are both recorded
    /// - empty reply: user turn and [`EMPTY_REPLY_NOTE`] are recorded
    /// - failure: only the user turn is recorded
    pub async fn generate(&mut self, instructions: &str) -> Generation {
        info!("[{}] Generating response via {}", self.name, self.backend.name());

        self.memory.push(Message::user(instructions));
        let context = self.memory.history(self.memory.max_history());

        match self
            .backend
            .send(&self.client, &self.config, &context)
            .await
        {
            Ok(reply) if reply.trim().is_empty() => {
                warn!("[{}] Empty content returned by {}", self.name, self.backend.name());
                self.memory.push(Message::assistant(EMPTY_REPLY_NOTE));
                Generation::Empty(EMPTY_REPLY_NOTE.to_string())
            }
            Ok(reply) => {
                debug!("[{}] Assistant response: {} chars", self.name, reply.len());
                self.memory.push(Message::assistant(reply.clone()));
                Generation::Reply(reply)
            }
            Err(e) => {
                let message = scrub_secrets(&format!("Error: {}", e));
                error!("[{}] {} request failed: {}", self.name, self.backend.name(), message);
                Generation::Failed(message)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Forget the conversation, system prompt included
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }
}

impl fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .field("model", &self.config.model)
            .field("messages", &self.memory.len())
            .finish()
    }
}
