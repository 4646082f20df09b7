//! Error types and handling
//!
//! This module provides the error types used throughout the Quorum engine.
//! All errors implement the `QuorumErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry credential values. Configuration errors name
//! the offending field or agent, not its contents.

use thiserror::Error;

/// Trait for Quorum error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait QuorumErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain secrets.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require the configuration to be fixed first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: missing or invalid model, credential, endpoint or
///   sampling parameters. Raised only while building adapters and agents.
/// - **Memory**: a message was appended with a role outside
///   system/user/assistant.
/// - **Environment**: keychain, HTTP client construction and file I/O.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, QuorumErrorExt};
///
/// let error = EngineError::MissingCredential("Router".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(!error.is_recoverable());
///
/// let role_error = EngineError::InvalidRole("tool".to_string());
/// assert!(role_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required LLM config: 'model' is required")]
    MissingModel,

    #[error("Unsupported model '{model}'. Supported models must start with one of: {supported}")]
    UnsupportedModel { model: String, supported: String },

    #[error("Missing required LLM config: 'api_key' is required for agent '{0}'")]
    MissingCredential(String),

    #[error("Missing required LLM config: 'base_url' is required for model '{model}'")]
    MissingEndpoint { model: String },

    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("max_tokens must be a positive integer")]
    InvalidTokenLimit,

    // Memory errors
    #[error("Invalid message role: '{0}'. Must be one of: system, user, assistant")]
    InvalidRole(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // HTTP client construction errors
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuorumErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::MissingModel => "Set a model for this agent in config.toml",
            Self::UnsupportedModel { .. } => "Pick a model supported by the agent's backend",
            Self::MissingCredential(_) => {
                "Set api_key or api_key_env for this agent, or store the key in the keychain"
            }
            Self::MissingEndpoint { .. } => "Set base_url for this agent in config.toml",
            Self::InvalidTemperature(_) => "Use a temperature between 0.0 and 2.0",
            Self::InvalidTokenLimit => "Use a max_tokens value greater than zero",
            Self::InvalidRole(_) => "Messages must use the system, user or assistant role",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::HttpClient(_) => "Could not initialise the HTTP client. Check TLS setup",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Construction-time failures: nothing to retry until config changes
            Self::Config(_)
            | Self::MissingModel
            | Self::UnsupportedModel { .. }
            | Self::MissingCredential(_)
            | Self::MissingEndpoint { .. }
            | Self::InvalidTemperature(_)
            | Self::InvalidTokenLimit
            | Self::HttpClient(_) => false,

            Self::InvalidRole(_) | Self::KeyringError(_) | Self::Io(_) => true,
        }
    }
}
