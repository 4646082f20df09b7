//! Quorum SDK
//!
//! Shared library providing traits, types, and errors for Quorum components.
//! This crate is used by the engine and by anything that wants to plug an
//! agent into the orchestrator.

/// Agent trait
pub mod agent;

/// Error types and handling
pub mod errors;

/// Message and generation types
pub mod types;

// Re-export commonly used types
pub use agent::TaskAgent;
pub use errors::{EngineError, QuorumErrorExt};
pub use types::{Generation, Message, MessageRole};
