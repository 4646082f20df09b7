//! Agents
//!
//! An [`Agent`] is a named role (Router, Developer, Verifier, Executor)
//! bound to exactly one [`ModelAdapter`]. Running an agent is one
//! `generate` call; the reply, empty notice or failure comes back as a
//! [`Generation`] and the adapter's memory records the turn.

pub mod memory;

pub use memory::ConversationMemory;

use async_trait::async_trait;
use sdk::agent::TaskAgent;
use sdk::errors::EngineError;
use sdk::types::Generation;

use crate::config::{AgentRole, Config};
use crate::llm::{AdapterParams, ModelAdapter};
use crate::secrets::CredentialStore;

/// A named role backed by one model adapter
#[derive(Debug)]
pub struct Agent {
    name: String,
    adapter: ModelAdapter,
}

impl Agent {
    pub fn new(name: impl Into<String>, adapter: ModelAdapter) -> Self {
        Self {
            name: name.into(),
            adapter,
        }
    }

    /// Build the agent configured for `role`.
    ///
    /// # Errors
    ///
    /// `EngineError::Config` when `role` has no agent table (only the
    /// executor is optional), otherwise whatever adapter construction
    /// reports: missing model, credential or endpoint.
    pub fn from_config(
        role: AgentRole,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Self, EngineError> {
        let agent = config.agents.get(role).ok_or_else(|| {
            EngineError::Config(format!("No agent configured for role '{}'", role))
        })?;

        let mut params = AdapterParams::new().with_timeout(config.http.timeout());
        params.model = agent.model.clone();
        params.base_url = agent.base_url.clone();
        params.temperature = agent.temperature;
        params.max_tokens = agent.max_tokens;
        params.api_key = credentials.resolve(agent);

        let system_prompt = agent
            .system_prompt
            .as_deref()
            .unwrap_or_else(|| role.default_prompt());

        let adapter = ModelAdapter::new(
            role.display_name(),
            system_prompt,
            params,
            agent.backend.create(),
            config.memory.max_history,
        )?;

        Ok(Self::new(role.display_name(), adapter))
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }
}

#[async_trait]
impl TaskAgent for Agent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, input: &str) -> Generation {
        tracing::debug!("[{}] Running with {} chars of input", self.name, input.len());
        self.adapter.generate(input).await
    }
}
