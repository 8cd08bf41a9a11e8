use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Message;

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The model that should answer.
    pub model: String,

    /// The full conversation, oldest message first.
    pub messages: Vec<Message>,

    /// Whether the server should stream the reply as server-sent events.
    pub stream: bool,
}

impl ChatRequest {
    /// Build a streaming request from a conversation snapshot.
    ///
    /// Messages are copied in order; nothing is reordered or rewritten.
    pub fn streaming(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: messages.to_vec(),
            stream: true,
        }
    }

    /// Check that the request is sendable.
    ///
    /// Only the model name is checked. An empty message list is left for the
    /// server to judge.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation(
                "model must not be empty",
                Some("model".to_string()),
            ));
        }
        Ok(())
    }

    /// Serialize the request into the bytes sent over the wire.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        self.validate()?;
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn streaming_request_serialization() {
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hi"),
        ];
        let request = ChatRequest::streaming("gpt-oss-20b", &messages);
        let json = to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({
                "model": "gpt-oss-20b",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "Hi"}
                ],
                "stream": true
            })
        );
    }

    #[test]
    fn snapshot_order_and_content_preserved() {
        let messages = vec![
            Message::system("sys"),
            Message::user("one"),
            Message::assistant("two"),
            Message::user("  three  \n"),
        ];
        let request = ChatRequest::streaming("m", &messages);
        assert_eq!(request.messages, messages);

        let body = request.to_body().unwrap();
        let parsed: ChatRequest = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.messages, messages);
        assert!(parsed.stream);
    }

    #[test]
    fn empty_model_rejected() {
        let request = ChatRequest::streaming("  ", &[Message::user("Hi")]);
        let err = request.to_body().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn empty_messages_allowed() {
        let request = ChatRequest::streaming("m", &[]);
        assert!(request.validate().is_ok());
    }
}
