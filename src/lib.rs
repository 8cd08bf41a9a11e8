// Public modules
pub mod chat;
pub mod client;
pub mod conversation;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use client::{Client, ClientOptions, ResponseBody, Transport};
pub use conversation::{Conversation, DEFAULT_SYSTEM_PROMPT};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use sse::{StreamDecoder, decode_stream};
pub use types::*;
