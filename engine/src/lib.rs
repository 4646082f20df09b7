//! Quorum Engine Library
//!
//! Multi-agent orchestration over language-model backends. It is used by
//! both the `quorum` binary and integration tests.

/// Configuration management module
pub mod config;

/// Credential resolution and secret scrubbing
pub mod secrets;

/// LLM backend abstraction layer
pub mod llm;

/// Agents and their conversation memory
pub mod agent;

/// Task routing pipeline
pub mod orchestrator;

/// Fenced code block extraction
pub mod code;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
