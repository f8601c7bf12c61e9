//! In-memory conversation history.
//!
//! The transcript only ever grows, except for an explicit [`Transcript::clear`].
//! User turns are appended before a request is sent; assistant turns only after
//! the reply arrived in full, so a failed exchange never leaks a half-written
//! reply into the context of the next request.

use crate::types::{ChatMessage, ChatRole};

/// Ordered, append-only list of chat messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    seed: Option<ChatMessage>,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript that always opens with `prompt` as a system message.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let seed = ChatMessage::system(prompt);
        Self {
            messages: vec![seed.clone()],
            seed: Some(seed),
        }
    }

    /// Appends a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    /// Appends an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// Appends a system message.
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::system(content));
    }

    /// All messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The newest user message, if any.
    pub fn last_user(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == ChatRole::User)
    }

    /// Number of messages, including the seed system prompt.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages are held.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of assistant replies recorded.
    pub fn exchanges(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count()
    }

    /// Drops the conversation, keeping the seed system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
        if let Some(seed) = &self.seed {
            self.messages.push(seed.clone());
        }
    }
}
