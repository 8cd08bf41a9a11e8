//! Output rendering for the chat loop.
//!
//! The chat loop never writes to the terminal directly; it goes through a
//! [`Renderer`] so the same loop can drive stdout or a test double.

use std::io::{self, Stdout, Write};

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for the user prompt).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// The prompt shown while waiting for the user's next line.
    fn prompt(&self, username: &str) -> String;

    /// Called once before the first fragment of a response.
    fn start_response(&mut self, label: &str);

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as fragments are decoded and must make
    /// the text visible before returning.
    fn print_text(&mut self, text: &str);

    /// Called when a response is complete.
    fn finish_response(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    in_response: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            in_response: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn end_response(&mut self) {
        if self.in_response {
            if self.use_color {
                print!("{ANSI_RESET}");
            }
            println!("\n");
            self.in_response = false;
            self.flush();
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn prompt(&self, username: &str) -> String {
        if self.use_color {
            format!("{ANSI_YELLOW}{username}:{ANSI_RESET} ")
        } else {
            format!("{username}: ")
        }
    }

    fn start_response(&mut self, label: &str) {
        if self.use_color {
            println!("\n{ANSI_CYAN}{label}:{ANSI_RESET}");
        } else {
            println!("\n{label}:");
        }
        self.in_response = true;
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        self.end_response();
    }

    fn print_error(&mut self, error: &str) {
        self.end_response();
        if self.use_color {
            eprintln!("{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }
}
