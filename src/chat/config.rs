//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::DEFAULT_IDLE_TIMEOUT;
use crate::marker::DEFAULT_MARKER;
use crate::types::{AssistantRole, PayloadMode};

/// Endpoint used when neither the command line nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/chat";

/// Environment variable consulted for the endpoint.
pub const ENDPOINT_ENV: &str = "FOLIO_CHAT_ENDPOINT";

/// Command-line arguments for the folio-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Chat endpoint URL.
    #[arrrg(
        optional,
        "Chat endpoint URL (default: $FOLIO_CHAT_ENDPOINT or http://localhost:8000/api/chat)",
        "URL"
    )]
    pub endpoint: Option<String>,

    /// Send only the latest prompt instead of the whole transcript.
    #[arrrg(flag, "Send only the latest prompt instead of the full transcript")]
    pub prompt_mode: bool,

    /// Send assistant turns with the legacy `model` role.
    #[arrrg(flag, "Send assistant turns with the legacy model role")]
    pub model_role: bool,

    /// System prompt that opens every conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Seconds to wait for the next reply chunk; 0 waits forever.
    #[arrrg(
        optional,
        "Seconds to wait for each reply chunk, 0 to wait forever (default: 60)",
        "SECS"
    )]
    pub idle_timeout_secs: Option<u64>,

    /// Cookie name that signals an active session.
    #[arrrg(optional, "Session cookie name (default: session)", "NAME")]
    pub marker: Option<String>,

    /// File that remembers the chosen theme.
    #[arrrg(optional, "File that stores the chosen theme", "PATH")]
    pub theme_file: Option<String>,

    /// Start in dark mode when no theme was saved.
    #[arrrg(flag, "Prefer the dark theme when none is saved")]
    pub prefer_dark: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// URL the conversation is posted to.
    pub endpoint: String,

    /// Payload shape the endpoint expects.
    pub payload_mode: PayloadMode,

    /// Role name assistant turns are sent with.
    pub assistant_role: AssistantRole,

    /// Optional system prompt seeded into the transcript.
    pub system_prompt: Option<String>,

    /// Longest wait for the next reply chunk; `None` waits forever.
    pub idle_timeout: Option<Duration>,

    /// Cookie name that reveals the access element.
    pub marker: String,

    /// Where the chosen theme is persisted; `None` keeps it in memory.
    pub theme_file: Option<PathBuf>,

    /// Whether the system prefers a dark colour scheme.
    pub prefer_dark: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://localhost:8000/api/chat
    /// - Payload: full transcript
    /// - Idle timeout: 60 seconds
    /// - Marker: `session`
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            payload_mode: PayloadMode::Transcript,
            assistant_role: AssistantRole::Assistant,
            system_prompt: None,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            marker: DEFAULT_MARKER.to_string(),
            theme_file: None,
            prefer_dark: false,
            use_color: true,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the payload mode.
    pub fn with_payload_mode(mut self, payload_mode: PayloadMode) -> Self {
        self.payload_mode = payload_mode;
        self
    }

    /// Sets the role name assistant turns are sent with.
    pub fn with_assistant_role(mut self, assistant_role: AssistantRole) -> Self {
        self.assistant_role = assistant_role;
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the session marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Sets the theme file.
    pub fn with_theme_file(mut self, path: Option<PathBuf>) -> Self {
        self.theme_file = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Builds a configuration from arguments, consulting `env_endpoint` when
    /// no endpoint was given on the command line.
    pub fn from_args_and_env(args: ChatArgs, env_endpoint: Option<String>) -> Self {
        let endpoint = args
            .endpoint
            .or(env_endpoint.filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let idle_timeout = match args.idle_timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_IDLE_TIMEOUT),
        };

        ChatConfig {
            endpoint,
            payload_mode: if args.prompt_mode {
                PayloadMode::Prompt
            } else {
                PayloadMode::Transcript
            },
            assistant_role: if args.model_role {
                AssistantRole::Model
            } else {
                AssistantRole::Assistant
            },
            system_prompt: args.system,
            idle_timeout,
            marker: args.marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            theme_file: args.theme_file.map(PathBuf::from),
            prefer_dark: args.prefer_dark,
            use_color: !args.no_color,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::from_args_and_env(args, std::env::var(ENDPOINT_ENV).ok())
    }
}
