//! Output rendering for the chat widget.
//!
//! The session drives a [`Renderer`] as a conversation unfolds: the user line,
//! a typing indicator, the streamed reply, and system notices.  The default
//! implementation writes to the terminal with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::theme::Theme;

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for system notices).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for the access notice).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to erase the current line after a carriage return.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Text shown while waiting for the first reply chunk.
const TYPING: &str = "…";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Show a message the user submitted.
    fn print_user(&mut self, text: &str);

    /// Show that a reply is on its way.
    fn show_typing(&mut self);

    /// Remove the typing indicator, if shown.
    fn hide_typing(&mut self);

    /// Open the line that streamed reply text is appended to.
    fn start_reply(&mut self);

    /// Append a chunk of reply text.
    ///
    /// This is called incrementally as the reply streams in.
    fn print_text(&mut self, text: &str);

    /// Called when a reply is complete.
    fn finish_response(&mut self);

    /// Show a system notice inside the conversation.
    fn print_system(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Reveal the element gated by the session marker.
    fn reveal_access(&mut self) {}

    /// Called when the active theme changes.
    fn theme_changed(&mut self, theme: Theme) {
        _ = theme;
    }

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    typing: bool,
    in_reply: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            typing: false,
            in_reply: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, color: &str, label: &str) -> String {
        if self.use_color {
            format!("{ANSI_BOLD}{color}{label}{ANSI_RESET}")
        } else {
            label.to_string()
        }
    }

    fn close_reply(&mut self) {
        if self.in_reply {
            println!();
            self.in_reply = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_user(&mut self, text: &str) {
        self.close_reply();
        println!("{} {text}", self.label(ANSI_CYAN, "You:"));
        self.flush();
    }

    fn show_typing(&mut self) {
        if self.typing {
            return;
        }
        self.typing = true;
        if self.use_color {
            print!("{ANSI_DIM}{TYPING}{ANSI_RESET}");
        } else {
            print!("{TYPING}");
        }
        self.flush();
    }

    fn hide_typing(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        if self.use_color {
            print!("{ANSI_CLEAR_LINE}");
        } else {
            println!();
        }
        self.flush();
    }

    fn start_reply(&mut self) {
        self.hide_typing();
        self.in_reply = true;
        print!("{} ", self.label("", "Assistant:"));
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        self.close_reply();
        self.flush();
    }

    fn print_system(&mut self, text: &str) {
        self.hide_typing();
        self.close_reply();
        println!("{} {text}", self.label(ANSI_YELLOW, "System:"));
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.hide_typing();
        self.close_reply();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.close_reply();
        println!("{info}");
    }

    fn reveal_access(&mut self) {
        self.close_reply();
        println!("{}", self.label(ANSI_GREEN, "[session active: access unlocked]"));
        self.flush();
    }

    fn theme_changed(&mut self, theme: Theme) {
        self.print_info(&format!("Theme set to {theme}."));
    }

    fn print_interrupted(&mut self) {
        self.hide_typing();
        self.close_reply();
        println!("[interrupted]");
        self.flush();
    }
}
