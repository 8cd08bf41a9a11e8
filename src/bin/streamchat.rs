//! Interactive terminal chat against an OpenAI-compatible endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Use (or create on first run) ~/.config/streamchat/config.yaml
//! streamchat
//!
//! # Override the model and endpoint for one run
//! streamchat --model llama3 --endpoint http://127.0.0.1:11434/v1
//!
//! # Disable colors (useful for piping output)
//! streamchat --no-color
//! ```
//!
//! Type `exit`, `quit`, or press Ctrl+D to leave. `/help` lists commands.

use std::path::PathBuf;
use std::process;

use arrrg::CommandLine;

use streamchat::Client;
use streamchat::chat::{
    self, ChatArgs, ChatConfig, ChatSession, EditorSource, PlainTextRenderer, Renderer,
    default_config_path,
};

/// Main entry point for the streamchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("streamchat [OPTIONS]");
    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    let mut input = EditorSource::new()?;

    let path = match &args.config {
        Some(path) => Ok(PathBuf::from(path)),
        None => default_config_path(),
    };
    let config = path
        .and_then(|path| ChatConfig::load_or_init(&path, &mut input, &mut renderer))
        .map(|config| config.with_args(&args).with_env_overrides());
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            renderer.print_error(&format!("error loading configuration: {err}"));
            process::exit(1);
        }
    };

    let client = match Client::new(config.client_options()) {
        Ok(client) => client,
        Err(err) => {
            renderer.print_error(&format!("error creating client: {err}"));
            process::exit(1);
        }
    };

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    println!("Welcome to streamchat! Type 'exit', 'quit', or press Ctrl+D to end the chat.");
    println!(
        "Connected to model '{}' at '{}'.\n",
        config.model, config.api_endpoint
    );

    let mut session = ChatSession::new(client, config);
    chat::run(&mut session, &mut input, &mut renderer).await?;
    Ok(())
}
