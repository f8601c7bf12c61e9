// Public modules
pub mod chat;
pub mod client;
pub mod decoder;
pub mod error;
pub mod marker;
pub mod observability;
pub mod particles;
pub mod render;
pub mod stream;
pub mod theme;
pub mod transcript;
pub mod types;

// Re-exports
pub use chat::{ChatConfig, ChatSession, SubmitOutcome};
pub use client::{ChatClient, ChatTransport, HttpTransport, TransportResponse};
pub use decoder::Utf8Decoder;
pub use error::{Error, Result};
pub use marker::{AccessGate, SessionMarker};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use stream::{ReadOptions, collect_reply, decode_stream, read_reply};
pub use theme::{Theme, ThemeController, ThemeStore};
pub use transcript::Transcript;
pub use types::*;
