//! Agent contract
//!
//! The orchestrator only ever sees this trait. Model-backed agents implement
//! it in the engine; tests substitute scripted doubles.

use crate::types::Generation;
use async_trait::async_trait;

/// A named participant that turns one input text into one generation
#[async_trait]
pub trait TaskAgent: Send {
    /// Display name of the agent (e.g. "Router")
    fn name(&self) -> &str;

    /// Run one turn.
    ///
    /// Takes `&mut self` because a turn mutates the agent's conversation
    /// memory; one agent instance serves one caller at a time.
    async fn run(&mut self, input: &str) -> Generation;
}
