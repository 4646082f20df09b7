//! Conversation and generation types

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt
    System,

    /// User message
    User,

    /// Assistant message
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(EngineError::InvalidRole(other.to_string())),
        }
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Result of one agent turn.
///
/// Backend failures are values, not errors: a pipeline keeps running after a
/// failed call, but the discriminant lets it tell a failure apart from model
/// output that merely looks like one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Generation {
    /// The backend answered with non-empty text
    Reply(String),

    /// The backend answered but the content was empty; carries the placeholder note
    Empty(String),

    /// Transport, status or response-shape failure; carries a descriptive message
    Failed(String),
}

impl Generation {
    /// Text of the generation, whatever its status
    pub fn text(&self) -> &str {
        match self {
            Generation::Reply(text) | Generation::Empty(text) | Generation::Failed(text) => text,
        }
    }

    /// Consume the generation and return its text
    pub fn into_text(self) -> String {
        match self {
            Generation::Reply(text) | Generation::Empty(text) | Generation::Failed(text) => text,
        }
    }

    /// True when the backend call failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Generation::Failed(_))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
