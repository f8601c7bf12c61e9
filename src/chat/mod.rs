//! Chat widget for conversations with the portfolio assistant.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! folio client library. It supports:
//!
//! - Streaming replies shown as each fragment arrives
//! - A friendly notice when the endpoint cannot be reached
//! - Slash commands for session control and theme switching
//! - Revealing the signed-in element once a session cookie appears
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and the submit flow
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_ENDPOINT, ENDPOINT_ENV};
pub use session::{CONNECTION_NOTICE, ChatSession, SessionStats, SubmitOutcome};
