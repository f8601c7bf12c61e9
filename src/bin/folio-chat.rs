//! Interactive chat with a portfolio assistant endpoint.
//!
//! This binary provides a streaming REPL for the chat widget: every message is
//! posted to the configured endpoint and the reply is printed as it arrives.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local endpoint
//! folio-chat
//!
//! # Talk to a deployed endpoint that only wants the latest prompt
//! folio-chat --endpoint https://example.com/api/chat --prompt-mode
//!
//! # Remember the chosen theme between runs
//! folio-chat --theme-file ~/.config/folio/theme.json
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/theme [light|dark|toggle]` - Switch the colour theme
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Set `RUST_LOG=folio=debug` to see request logging on stderr.

use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;

use folio::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use folio::theme::{FileThemeStore, MemoryThemeStore, ThemeController, ThemeStore};

/// Main entry point for the folio-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("folio-chat [OPTIONS]");
    init_logging();
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let store: Box<dyn ThemeStore> = match &config.theme_file {
        Some(path) => Box::new(FileThemeStore::new(path.clone())),
        None => Box::new(MemoryThemeStore::new()),
    };
    let mut theme = ThemeController::init(store, config.prefer_dark);

    let mut session = ChatSession::new(config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C during a reply cancels whichever token belongs to that reply.
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    let handler_token = Arc::clone(&current);
    ctrlc::set_handler(move || {
        if let Ok(token) = handler_token.lock() {
            token.cancel();
        }
    })?;

    println!("Folio Chat ({})", session.config().endpoint);
    println!("Theme: {}", theme.current());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {line}");
                            }
                        }
                        ChatCommand::Theme(choice) => {
                            let applied = match choice {
                                Some(next) => theme.apply(next).map(|()| next),
                                None => theme.toggle(),
                            };
                            match applied {
                                Ok(next) => renderer.theme_changed(next),
                                Err(err) => {
                                    renderer.print_error(&format!("Failed to save theme: {err}"))
                                }
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session, &theme);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let token = CancellationToken::new();
                if let Ok(mut slot) = current.lock() {
                    *slot = token.clone();
                }
                // Failures are already reported in the conversation.
                let _ = session
                    .submit_with_cancel(line, &mut renderer, token)
                    .await;
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("folio=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_stats(session: &ChatSession, theme: &ThemeController) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Endpoint: {}", stats.endpoint);
    println!("      Payload: {:?}", stats.payload_mode);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Exchanges: {} ok / {} failed",
        stats.exchanges, stats.failures
    );
    println!("      Reply bytes: {}", stats.reply_bytes);
    println!(
        "      Session: {}",
        if stats.access_visible {
            "active"
        } else {
            "not signed in"
        }
    );
    println!("      Theme: {}", theme.current());
    match session.config().idle_timeout {
        Some(timeout) => println!("      Idle timeout: {}s", timeout.as_secs()),
        None => println!("      Idle timeout: (none)"),
    }
}
