//! Chat-completion client for onechat.
//!
//! Pure HTTP client for an OpenAI-compatible `chat/completions` endpoint.
//! The base URL is swappable, so a proxy host can stand in for the default
//! API host.

mod client;
mod error;
mod types;
mod wire;

pub use client::{DEFAULT_BASE_URL, LlmClient};
pub use error::{LlmError, Result};
pub use types::{ChatMessage, ChatResponse, Role, StreamChunk, Usage};
