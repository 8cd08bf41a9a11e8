use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The incremental piece of a message carried by a streamed choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDelta {
    /// Text appended to the assistant reply; absent or null on role-only chunks.
    #[serde(default)]
    pub content: Option<String>,
}

/// One choice within a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    /// The delta for this choice.
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: StreamDelta,

    /// Why generation stopped; any non-null value ends the stream.
    #[serde(default)]
    pub finish_reason: Option<Value>,
}

impl StreamChoice {
    /// The text carried by this choice, or the empty string.
    pub fn text(&self) -> &str {
        self.delta.content.as_deref().unwrap_or("")
    }
}

/// The JSON object carried by a `data:` line of a chat completion stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Choices in this chunk; only the first one is consulted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<StreamChoice>,
}

impl StreamChunk {
    /// The first choice, if the chunk has any.
    pub fn first_choice(&self) -> Option<&StreamChoice> {
        self.choices.first()
    }
}
