//! Chat application module for interactive conversations.
//!
//! This module provides a streaming REPL built on top of the client and the
//! stream decoder. It supports:
//!
//! - Streaming responses with real-time token display
//! - Conversation history sent as context with every turn
//! - Rollback of turns whose request or stream failed
//! - A YAML configuration file created on first run
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and turn execution
//! - [`commands`]: Classification of input lines
//! - [`input`]: Line input from the terminal

mod commands;
mod config;
mod input;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatInput, help_text, parse_input};
pub use config::{
    API_KEY_ENV, ChatArgs, ChatConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_USERNAME,
    default_config_path,
};
pub use input::{EditorSource, LineSource};
pub use session::{ChatSession, SessionStats};

use crate::client::Transport;
use crate::error::Result;

/// Run the interactive loop until the user leaves or input ends.
///
/// Each line is read, classified, and either handled locally or sent to the
/// model as one turn. A failed turn is reported through the renderer and the
/// loop carries on; only an error reading input ends it early.
pub async fn run<T: Transport>(
    session: &mut ChatSession<T>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<()> {
    loop {
        let prompt = renderer.prompt(session.username());
        let Some(line) = input.read_line(&prompt)? else {
            renderer.print_info("\nGoodbye!");
            return Ok(());
        };

        match parse_input(&line) {
            ChatInput::Quit => {
                renderer.print_info("Goodbye!");
                return Ok(());
            }
            ChatInput::Empty => continue,
            ChatInput::Help => {
                for line in help_text().lines() {
                    renderer.print_info(&format!("    {line}"));
                }
            }
            ChatInput::Stats => print_stats(&session.stats(), renderer),
            ChatInput::Invalid(message) => renderer.print_error(&message),
            ChatInput::Message(text) => {
                if let Err(err) = session.send_streaming(&text, renderer).await {
                    renderer.print_error(&format!("error getting response: {err}"));
                }
            }
        }
    }
}

fn print_stats(stats: &SessionStats, renderer: &mut dyn Renderer) {
    renderer.print_info("    Session Statistics:");
    renderer.print_info(&format!("      Model: {}", stats.model));
    renderer.print_info(&format!("      Endpoint: {}", stats.endpoint));
    renderer.print_info(&format!("      Messages: {}", stats.message_count));
    renderer.print_info(&format!(
        "      Turns: {} completed / {} failed",
        stats.completed_turns, stats.failed_turns
    ));
}
