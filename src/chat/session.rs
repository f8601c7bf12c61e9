//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the transcript,
//! drives the renderer through one exchange at a time and keeps the session
//! marker gate up to date.

use tokio_util::sync::CancellationToken;

use crate::chat::config::ChatConfig;
use crate::client::{ChatClient, HttpTransport};
use crate::error::{Error, Result};
use crate::marker::{AccessGate, SessionMarker};
use crate::observability::{SESSION_FAILURES, SESSION_IGNORED, SESSION_SUBMISSIONS};
use crate::render::Renderer;
use crate::transcript::Transcript;
use crate::types::{ChatRequest, PayloadMode};

/// Notice shown in the conversation when an exchange fails.
pub const CONNECTION_NOTICE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was blank; nothing was sent or recorded.
    Ignored,
    /// The endpoint replied with this text, now recorded in the transcript.
    Replied(String),
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The endpoint in use.
    pub endpoint: String,
    /// The payload shape in use.
    pub payload_mode: PayloadMode,
    /// The number of messages in the transcript.
    pub message_count: usize,
    /// Completed exchanges.
    pub exchanges: u64,
    /// Exchanges that failed or were interrupted.
    pub failures: u64,
    /// Bytes of reply text received, including partial replies.
    pub reply_bytes: u64,
    /// Whether the session marker has been seen.
    pub access_visible: bool,
}

/// A chat session that manages conversation state and endpoint interactions.
///
/// Submissions take `&mut self`, so a session never has two replies
/// streaming at once.
pub struct ChatSession {
    client: ChatClient,
    config: ChatConfig,
    transcript: Transcript,
    gate: AccessGate,
    exchanges: u64,
    failures: u64,
    reply_bytes: u64,
}

impl ChatSession {
    /// Creates a session talking HTTP to the configured endpoint.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let transport =
            HttpTransport::new(&config.endpoint)?.with_assistant_role(config.assistant_role);
        let client = ChatClient::with_http(transport).with_idle_timeout(config.idle_timeout);
        Ok(Self::with_client(client, config))
    }

    /// Creates a session on top of an existing client.
    pub fn with_client(client: ChatClient, config: ChatConfig) -> Self {
        let transcript = match &config.system_prompt {
            Some(prompt) => Transcript::with_system_prompt(prompt.clone()),
            None => Transcript::new(),
        };
        let gate = AccessGate::new(SessionMarker::new(config.marker.clone()));
        Self {
            client,
            config,
            transcript,
            gate,
            exchanges: 0,
            failures: 0,
            reply_bytes: 0,
        }
    }

    /// Submits user input and streams the reply.
    ///
    /// This method:
    /// 1. Ignores blank input without touching the transcript
    /// 2. Adds the user message to the transcript
    /// 3. Streams the reply into the renderer as it arrives
    /// 4. Adds the complete assistant reply to the transcript
    ///
    /// # Errors
    ///
    /// Returns the transport error if the exchange fails.  The renderer has
    /// already shown a notice by then and no assistant message is recorded.
    pub async fn submit(
        &mut self,
        input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<SubmitOutcome> {
        self.submit_with_cancel(input, renderer, CancellationToken::new())
            .await
    }

    /// Like [`submit`](ChatSession::submit), stopping the stream when `cancel` fires.
    pub async fn submit_with_cancel(
        &mut self,
        input: &str,
        renderer: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Result<SubmitOutcome> {
        let text = input.trim();
        if text.is_empty() {
            SESSION_IGNORED.click();
            return Ok(SubmitOutcome::Ignored);
        }
        SESSION_SUBMISSIONS.click();

        renderer.print_user(text);
        self.transcript.push_user(text);
        renderer.show_typing();

        let request =
            match ChatRequest::from_transcript(self.config.payload_mode, self.transcript.messages())
            {
                Ok(request) => request,
                Err(err) => return Err(self.fail(err, renderer, false)),
            };

        let mut opened = false;
        let mut received = 0u64;
        let result = self
            .client
            .send_message_with_cancel(&request, cancel, |chunk| {
                if !opened {
                    renderer.start_reply();
                    opened = true;
                }
                received += chunk.len() as u64;
                renderer.print_text(chunk);
            })
            .await;
        self.reply_bytes += received;

        match result {
            Ok(reply) => {
                if !opened {
                    renderer.start_reply();
                }
                renderer.finish_response();
                self.transcript.push_assistant(reply.clone());
                self.exchanges += 1;
                self.check_access(renderer);
                Ok(SubmitOutcome::Replied(reply))
            }
            Err(err) => Err(self.fail(err, renderer, opened)),
        }
    }

    fn fail(&mut self, err: Error, renderer: &mut dyn Renderer, opened: bool) -> Error {
        SESSION_FAILURES.click();
        self.failures += 1;
        if opened {
            renderer.finish_response();
        } else {
            renderer.hide_typing();
        }
        if err.is_cancelled() {
            renderer.print_interrupted();
        } else {
            tracing::warn!(error = %err, "chat exchange failed");
            renderer.print_system(CONNECTION_NOTICE);
        }
        err
    }

    fn check_access(&mut self, renderer: &mut dyn Renderer) {
        if let Some(cookies) = self.client.cookies()
            && self.gate.refresh(&cookies)
        {
            renderer.reveal_access();
        }
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// The conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Whether the session marker has revealed the access element.
    pub fn access_visible(&self) -> bool {
        self.gate.is_visible()
    }

    /// The active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            endpoint: self.config.endpoint.clone(),
            payload_mode: self.config.payload_mode,
            message_count: self.message_count(),
            exchanges: self.exchanges,
            failures: self.failures,
            reply_bytes: self.reply_bytes,
            access_visible: self.access_visible(),
        }
    }
}
