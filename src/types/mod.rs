// Public modules
pub mod chat_request;
pub mod message;
pub mod stream_chunk;
pub mod stream_fragment;

// Re-exports
pub use chat_request::ChatRequest;
pub use message::{Message, Role};
pub use stream_chunk::{StreamChoice, StreamChunk, StreamDelta};
pub use stream_fragment::{StreamEnd, StreamFragment};
