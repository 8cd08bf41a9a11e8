//! Line input for the chat loop.

use std::io;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// A source of user input lines.
pub trait LineSource {
    /// Show `prompt` and read one line.
    ///
    /// Returns `Ok(None)` once input has ended.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Line source backed by a rustyline editor with in-memory history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    /// Creates a new editor-backed line source.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl+C at the prompt only abandons the current line.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(readline_error(err)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    Error::io(
        format!("error reading input: {err}"),
        io::Error::other(err.to_string()),
    )
}
