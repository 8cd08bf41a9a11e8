//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! and runs one streamed turn at a time against a [`Transport`].

use std::time::Instant;

use crate::chat::config::ChatConfig;
use crate::client::Transport;
use crate::conversation::Conversation;
use crate::error::Result;
use crate::observability::{CHAT_ROLLBACKS, CHAT_TURN_DURATION, CHAT_TURNS};
use crate::render::Renderer;
use crate::sse::decode_stream;
use crate::types::ChatRequest;

/// A chat session that manages conversation state and API interactions.
pub struct ChatSession<T: Transport> {
    transport: T,
    config: ChatConfig,
    conversation: Conversation,
    completed_turns: u64,
    failed_turns: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: String,
    /// The endpoint requests are sent to.
    pub endpoint: String,
    /// The number of messages in the conversation, including the system message.
    pub message_count: usize,
    /// Turns whose reply was committed to the conversation.
    pub completed_turns: u64,
    /// Turns that were rolled back.
    pub failed_turns: u64,
}

impl<T: Transport> ChatSession<T> {
    /// Creates a new chat session seeded with the configured system prompt.
    pub fn new(transport: T, config: ChatConfig) -> Self {
        let conversation = Conversation::new(config.system_prompt());
        Self {
            transport,
            config,
            conversation,
            completed_turns: 0,
            failed_turns: 0,
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request carrying the whole history
    /// 3. Renders response fragments as they arrive
    /// 4. Adds the complete assistant response to history
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the stream breaks. The user message is removed
    /// again, so the history is exactly as it was before the call.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        CHAT_TURNS.click();
        let start = Instant::now();

        self.conversation.push_user(user_input);
        let outcome = self.stream_reply(renderer).await;
        CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());

        match outcome {
            Ok(reply) => {
                self.conversation.push_assistant(reply.clone());
                self.completed_turns += 1;
                Ok(reply)
            }
            Err(err) => {
                CHAT_ROLLBACKS.click();
                let removed = self.conversation.remove_last_user();
                debug_assert!(removed.is_some(), "rollback found no user message");
                self.failed_turns += 1;
                Err(err)
            }
        }
    }

    async fn stream_reply(&self, renderer: &mut dyn Renderer) -> Result<String> {
        let request = ChatRequest::streaming(&self.config.model, self.conversation.snapshot());
        let body = self.transport.open_stream(&request).await?;
        renderer.start_response(&self.config.model);
        let reply = decode_stream(body, &mut *renderer).await?;
        renderer.finish_response();
        Ok(reply)
    }

    /// The conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    /// The transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current model.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// The name shown at the input prompt.
    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            endpoint: self.config.api_endpoint.clone(),
            message_count: self.message_count(),
            completed_turns: self.completed_turns,
            failed_turns: self.failed_turns,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    use super::*;
    use crate::client::ResponseBody;
    use crate::error::Error;
    use crate::types::{Message, Role};

    enum Reply {
        Body(&'static str),
        Status(u16),
        Broken(&'static str),
    }

    struct Scripted {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Transport for Scripted {
        async fn open_stream(&self, request: &ChatRequest) -> Result<ResponseBody> {
            self.requests.lock().unwrap().push(request.clone());
            match self.replies.lock().unwrap().pop_front().expect("unscripted request") {
                Reply::Body(body) => Ok(Box::pin(body.as_bytes())),
                Reply::Status(code) => Err(Error::api(code, "scripted failure")),
                Reply::Broken(prefix) => {
                    let mock = tokio_test::io::Builder::new()
                        .read(prefix.as_bytes())
                        .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
                        .build();
                    Ok(Box::pin(tokio::io::BufReader::new(mock)))
                }
            }
        }
    }

    #[derive(Default)]
    struct Transcript {
        text: String,
        responses: usize,
    }

    impl Renderer for Transcript {
        fn prompt(&self, username: &str) -> String {
            format!("{username}: ")
        }
        fn start_response(&mut self, _label: &str) {
            self.responses += 1;
        }
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
        }
        fn finish_response(&mut self) {}
        fn print_error(&mut self, _error: &str) {}
        fn print_info(&mut self, _info: &str) {}
    }

    const HELLO: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
data: [DONE]\n";

    #[tokio::test]
    async fn successful_turn_appends_both_messages() {
        let transport = Scripted::new(vec![Reply::Body(HELLO)]);
        let mut session = ChatSession::new(transport, ChatConfig::new());
        let mut renderer = Transcript::default();

        let reply = session.send_streaming("Hi", &mut renderer).await.unwrap();
        assert_eq!(reply, "Hello");
        assert_eq!(renderer.text, "Hello");
        assert_eq!(
            session.conversation().snapshot(),
            &[
                Message::system(session.config().system_prompt()),
                Message::user("Hi"),
                Message::assistant("Hello"),
            ]
        );
    }

    #[tokio::test]
    async fn request_carries_full_history() {
        let transport = Scripted::new(vec![Reply::Body(HELLO), Reply::Body(HELLO)]);
        let mut session = ChatSession::new(transport, ChatConfig::new().with_model("tiny"));
        let mut renderer = Transcript::default();

        session.send_streaming("one", &mut renderer).await.unwrap();
        session.send_streaming("two", &mut renderer).await.unwrap();

        let requests = session.transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].model, "tiny");
        assert!(requests[1].stream);
        let roles: Vec<Role> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(requests[1].messages[3].content, "two");
    }

    #[tokio::test]
    async fn status_failure_rolls_back() {
        let transport = Scripted::new(vec![Reply::Status(500)]);
        let mut session = ChatSession::new(transport, ChatConfig::new());
        let mut renderer = Transcript::default();
        let before = session.conversation().clone();

        let err = session.send_streaming("Hi", &mut renderer).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(session.conversation(), &before);
        assert_eq!(renderer.responses, 0);
        assert_eq!(session.stats().failed_turns, 1);
    }

    #[tokio::test]
    async fn broken_stream_discards_partial_reply() {
        let transport = Scripted::new(vec![Reply::Broken(
            "data: {\"choices\":[{\"delta\":{\"content\":\"part\"}}]}\n",
        )]);
        let mut session = ChatSession::new(transport, ChatConfig::new());
        let mut renderer = Transcript::default();

        let err = session.send_streaming("Hi", &mut renderer).await.unwrap_err();
        assert!(err.is_streaming());
        assert_eq!(renderer.text, "part");
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn empty_reply_still_committed() {
        let transport = Scripted::new(vec![Reply::Body("data: [DONE]\n")]);
        let mut session = ChatSession::new(transport, ChatConfig::new());
        let mut renderer = Transcript::default();

        let reply = session.send_streaming("Hi", &mut renderer).await.unwrap();
        assert!(reply.is_empty());
        assert_eq!(session.message_count(), 3);
        assert_eq!(
            session.conversation().last(),
            Some(&Message::assistant(""))
        );
    }

    #[tokio::test]
    async fn stats_track_turns() {
        let transport = Scripted::new(vec![Reply::Body(HELLO), Reply::Status(404)]);
        let config = ChatConfig::new().with_endpoint("http://example.test/v1");
        let mut session = ChatSession::new(transport, config);
        let mut renderer = Transcript::default();

        session.send_streaming("a", &mut renderer).await.unwrap();
        let _ = session.send_streaming("b", &mut renderer).await;

        let stats = session.stats();
        assert_eq!(stats.completed_turns, 1);
        assert_eq!(stats.failed_turns, 1);
        assert_eq!(stats.message_count, 3);
        assert_eq!(stats.endpoint, "http://example.test/v1");
        assert_eq!(stats.model, session.model());
    }
}
