//! Conversation Memory for Agents
//!
//! Each agent keeps its own ordered, bounded log of role-tagged messages.
//! The log holds at most `max_history` messages; appending past the bound
//! evicts from the front, oldest first. The system prompt gets no special
//! treatment: once enough turns pile up it is evicted like any other message.

use std::collections::VecDeque;

use sdk::errors::EngineError;
use sdk::types::{Message, MessageRole};

/// Default maximum number of messages kept per agent
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Default window returned by [`ConversationMemory::recent`]
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Bounded FIFO log of conversation messages
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    /// Messages in chronological order, newest last
    messages: VecDeque<Message>,

    /// Maximum number of messages retained
    max_history: usize,
}

impl ConversationMemory {
    /// Create an empty memory with the default bound
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    /// Create an empty memory holding at most `max_history` messages
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_history.saturating_add(1)),
            max_history,
        }
    }

    /// Append a message given its role by name.
    ///
    /// Fails with [`EngineError::InvalidRole`] for anything other than
    /// `system`, `user` or `assistant`; memory is left untouched in that case.
    pub fn append(&mut self, role: &str, content: impl Into<String>) -> Result<(), EngineError> {
        let role: MessageRole = role.parse()?;
        self.push(Message::new(role, content));
        Ok(())
    }

    /// Append an already-typed message, evicting the oldest entries when the
    /// bound is exceeded
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);

        while self.messages.len() > self.max_history {
            self.messages.pop_front();
        }
    }

    /// The most recent `limit` messages, oldest first, as a copy
    pub fn history(&self, limit: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// The most recent [`DEFAULT_HISTORY_LIMIT`] messages
    pub fn recent(&self) -> Vec<Message> {
        self.history(DEFAULT_HISTORY_LIMIT)
    }

    /// Borrowed view of every retained message
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Most recently appended message
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}
