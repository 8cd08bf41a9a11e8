//! Ordered chat history sent as context with every request.

use crate::types::{Message, Role};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Append-only, role-tagged chat history.
///
/// The first message is always the system message supplied at construction.
/// The only removal is [`Conversation::remove_last_user`], which exists to
/// undo the user half of a turn whose response failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation seeded with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Add a message at the end of the history.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add a user message at the end of the history.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(Message::user(content));
    }

    /// Add an assistant message at the end of the history.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.append(Message::assistant(content));
    }

    /// The full history, oldest first.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages, including the system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false for a conversation built with [`Conversation::new`].
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove and return the trailing message if it was written by the user.
    ///
    /// Returns `None` and leaves the history untouched otherwise.
    pub fn remove_last_user(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(message) if message.role == Role::User => self.messages.pop(),
            _ => None,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_system_message() {
        let conversation = Conversation::default();
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_empty());
        assert_eq!(
            conversation.snapshot()[0],
            Message::system(DEFAULT_SYSTEM_PROMPT)
        );
    }

    #[test]
    fn appends_in_order() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("hello");
        conversation.push_assistant("hi");
        conversation.append(Message::user("again"));

        let roles: Vec<Role> = conversation.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(conversation.last(), Some(&Message::user("again")));
    }

    #[test]
    fn remove_last_user_restores_previous_state() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("q1");
        conversation.push_assistant("a1");
        let before = conversation.clone();

        conversation.push_user("q2");
        assert_eq!(conversation.remove_last_user(), Some(Message::user("q2")));
        assert_eq!(conversation, before);
    }

    #[test]
    fn remove_last_user_refuses_other_roles() {
        let mut conversation = Conversation::new("sys");
        assert_eq!(conversation.remove_last_user(), None);
        assert_eq!(conversation.len(), 1);

        conversation.push_user("q");
        conversation.push_assistant("a");
        assert_eq!(conversation.remove_last_user(), None);
        assert_eq!(conversation.len(), 3);
    }
}
