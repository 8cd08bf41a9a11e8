//! Classification of user input lines.
//!
//! A line is either an instruction to the client itself (leave, show help,
//! show statistics) or a message to send to the model. Commands never touch
//! the conversation history.

/// A classified line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// End the chat.
    Quit,

    /// Nothing to do; prompt again.
    Empty,

    /// Display help information.
    Help,

    /// Display session statistics.
    Stats,

    /// Report a parsing error back to the user.
    Invalid(String),

    /// Send this text to the model.
    Message(String),
}

/// Classifies a line of user input.
///
/// "exit" and "quit" end the chat in any letter case, as do `/exit` and
/// `/quit`. Everything else that does not start with `/` is a message.
///
/// # Examples
///
/// ```
/// # use streamchat::chat::{parse_input, ChatInput};
/// assert_eq!(parse_input("  QUIT \n"), ChatInput::Quit);
/// assert_eq!(parse_input("   "), ChatInput::Empty);
/// assert_eq!(parse_input(" Hello! "), ChatInput::Message("Hello!".to_string()));
/// ```
pub fn parse_input(input: &str) -> ChatInput {
    let input = input.trim();

    if input.is_empty() {
        return ChatInput::Empty;
    }
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return ChatInput::Quit;
    }

    let Some(rest) = input.strip_prefix('/') else {
        return ChatInput::Message(input.to_string());
    };
    let command = rest.split_whitespace().next().unwrap_or("").to_lowercase();
    match command.as_str() {
        "quit" | "exit" | "q" => ChatInput::Quit,
        "help" | "?" => ChatInput::Help,
        "stats" | "status" => ChatInput::Stats,
        _ => ChatInput::Invalid(format!(
            "Unknown command: /{command} (type /help for commands)"
        )),
    }
}

/// Returns the help text describing the available commands.
pub fn help_text() -> &'static str {
    "Commands:
  /help, /?       Show this help message
  /stats          Show session statistics
  /quit, /exit    Exit the chat (also: exit, quit, Ctrl+D)"
}
