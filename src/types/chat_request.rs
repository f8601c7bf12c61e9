use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatRole};

/// Which payload shape the chat endpoint expects.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PayloadMode {
    /// Send the whole transcript as `{"messages": [...]}`.
    #[default]
    Transcript,

    /// Send only the latest user text as `{"prompt": "..."}`.
    Prompt,
}

impl std::str::FromStr for PayloadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transcript" | "messages" => Ok(PayloadMode::Transcript),
            "prompt" => Ok(PayloadMode::Prompt),
            _ => Err(format!(
                "Invalid payload mode: {s}. Valid options: transcript, prompt"
            )),
        }
    }
}

/// The role name assistant turns carry on the wire.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AssistantRole {
    /// `"assistant"`.
    #[default]
    Assistant,

    /// `"model"`, as expected by older chat backends.
    Model,
}

impl AssistantRole {
    /// The wire name for `role` under this naming.
    pub fn wire_name(self, role: ChatRole) -> &'static str {
        match (role, self) {
            (ChatRole::User, _) => "user",
            (ChatRole::System, _) => "system",
            (ChatRole::Assistant, AssistantRole::Assistant) => "assistant",
            (ChatRole::Assistant, AssistantRole::Model) => "model",
        }
    }
}

impl std::str::FromStr for AssistantRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assistant" => Ok(AssistantRole::Assistant),
            "model" => Ok(AssistantRole::Model),
            _ => Err(format!(
                "Invalid assistant role: {s}. Valid options: assistant, model"
            )),
        }
    }
}

/// A message as it is serialized onto the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireMessage<'a> {
    /// Role name under the chosen [`AssistantRole`].
    pub role: &'static str,
    /// The text of the message.
    pub content: &'a str,
}

/// A borrowed view of a [`ChatRequest`] ready to serialize.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WireRequest<'a> {
    /// The full conversation so far.
    Messages {
        /// Ordered transcript.
        messages: Vec<WireMessage<'a>>,
    },

    /// A single prompt.
    Prompt {
        /// The prompt text.
        prompt: &'a str,
    },
}

/// Body of a POST to the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChatRequest {
    /// The full conversation so far.
    Messages {
        /// Ordered transcript, ending with the newest user message.
        messages: Vec<ChatMessage>,
    },

    /// A single prompt.
    Prompt {
        /// The prompt text.
        prompt: String,
    },
}

impl ChatRequest {
    /// Create a transcript request.
    pub fn messages(messages: impl Into<Vec<ChatMessage>>) -> Self {
        ChatRequest::Messages {
            messages: messages.into(),
        }
    }

    /// Create a single-prompt request.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        ChatRequest::Prompt {
            prompt: prompt.into(),
        }
    }

    /// Build the request for `mode` out of a transcript.
    pub fn from_transcript(mode: PayloadMode, messages: &[ChatMessage]) -> Result<Self> {
        let request = match mode {
            PayloadMode::Transcript => Self::messages(messages.to_vec()),
            PayloadMode::Prompt => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == ChatRole::User)
                    .ok_or_else(|| {
                        Error::validation("transcript has no user message", Some("prompt".into()))
                    })?;
                Self::prompt(last.content.clone())
            }
        };
        request.validate()?;
        Ok(request)
    }

    /// The wire form of this request with assistant turns named by `naming`.
    pub fn to_wire(&self, naming: AssistantRole) -> WireRequest<'_> {
        match self {
            ChatRequest::Messages { messages } => WireRequest::Messages {
                messages: messages
                    .iter()
                    .map(|m| WireMessage {
                        role: naming.wire_name(m.role),
                        content: &m.content,
                    })
                    .collect(),
            },
            ChatRequest::Prompt { prompt } => WireRequest::Prompt { prompt },
        }
    }

    /// The text of the newest user turn, if any.
    pub fn latest_user_text(&self) -> Option<&str> {
        match self {
            ChatRequest::Messages { messages } => messages
                .iter()
                .rev()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content.as_str()),
            ChatRequest::Prompt { prompt } => Some(prompt.as_str()),
        }
    }

    /// Check that the newest user message is present and non-blank.
    pub fn validate(&self) -> Result<()> {
        match self.latest_user_text() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            Some(_) => Err(Error::validation(
                "latest user message is empty",
                Some("content".to_string()),
            )),
            None => Err(Error::validation(
                "request has no user message",
                Some("messages".to_string()),
            )),
        }
    }
}
