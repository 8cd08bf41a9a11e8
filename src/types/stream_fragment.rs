use serde_json::Value;

/// Why a decoded stream stopped producing text.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEnd {
    /// The server sent `data: [DONE]`.
    Done,

    /// The first choice carried a non-null finish reason.
    Finished(Value),

    /// The transport ran out of lines.
    Eof,
}

/// A unit of decoded output from a chat completion stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFragment {
    /// A non-empty piece of assistant text.
    Text(String),

    /// The stream is over; no further text will follow.
    End(StreamEnd),
}
