//! Configuration types for the chat application.
//!
//! The configuration lives in a YAML file under the user's config directory.
//! It is created interactively on first run and can be overridden per run
//! from the command line (parsed with `arrrg`) and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::chat::input::LineSource;
use crate::client::ClientOptions;
use crate::conversation::DEFAULT_SYSTEM_PROMPT;
use crate::error::{Error, Result};
use crate::render::Renderer;

/// Default API endpoint offered during first-run setup.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/v1";

/// Default model offered during first-run setup.
pub const DEFAULT_MODEL: &str = "gpt-oss-20b";

/// Default display name for the user.
pub const DEFAULT_USERNAME: &str = "User";

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "STREAMCHAT_API_KEY";

/// Command-line arguments for the streamchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Path to the configuration file.
    #[arrrg(optional, "Configuration file (default: ~/.config/streamchat/config.yaml)", "PATH")]
    pub config: Option<String>,

    /// API endpoint to use for this run.
    #[arrrg(optional, "API base URL, e.g. http://127.0.0.1:8080/v1", "URL")]
    pub endpoint: Option<String>,

    /// Model to use for this run.
    #[arrrg(optional, "Model name", "MODEL")]
    pub model: Option<String>,

    /// Display name for this run.
    #[arrrg(optional, "Name shown at the input prompt", "NAME")]
    pub username: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,

    /// Optional bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// The model to request completions from.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name shown at the input prompt.
    #[serde(default = "default_username")]
    pub username: String,

    /// Optional system prompt; the built-in one is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    #[serde(skip, default = "default_use_color")]
    pub use_color: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_use_color() -> bool {
    true
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            api_endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            username: default_username(),
            system_prompt: None,
            use_color: true,
        }
    }

    /// Sets the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the display name.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Applies command-line overrides.
    pub fn with_args(mut self, args: &ChatArgs) -> Self {
        if let Some(endpoint) = &args.endpoint {
            self.api_endpoint = endpoint.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(username) = &args.username {
            self.username = username.clone();
        }
        if let Some(system) = &args.system {
            self.system_prompt = Some(system.clone());
        }
        if args.no_color {
            self.use_color = false;
        }
        self.normalized()
    }

    /// Applies overrides taken from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }
        self
    }

    /// The API key, if a non-empty one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// The system prompt that seeds every conversation.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Connection settings for the HTTP client.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::new(self.api_endpoint.clone())
            .with_api_key(self.api_key().map(str::to_string))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|err| Error::io(format!("could not read {}", path.display()), err))?;
        let config: Self = serde_yaml::from_str(&content).map_err(|err| {
            Error::serialization(
                format!("could not decode config file {}: {err}", path.display()),
                Some(Box::new(err)),
            )
        })?;
        Ok(config.normalized())
    }

    /// Saves the configuration, creating its directory if needed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            create_config_dir(dir)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .map_err(|err| Error::io(format!("could not write {}", path.display()), err))
    }

    /// Loads the configuration at `path`, or creates it interactively.
    ///
    /// When the file is missing the user is asked for each setting, with
    /// an empty answer selecting the default, and the result is saved.
    pub fn load_or_init(
        path: &Path,
        input: &mut dyn LineSource,
        renderer: &mut dyn Renderer,
    ) -> Result<Self> {
        if path.exists() {
            let config = Self::from_file(path)?;
            renderer.print_info(&format!("Configuration loaded from {}", path.display()));
            return Ok(config);
        }

        renderer.print_info("Configuration file not found. Let's set it up.");
        let endpoint = ask(
            input,
            &format!("Enter API Endpoint URL [{DEFAULT_ENDPOINT}]: "),
        )?;
        let api_key = ask(input, "Enter API Key (optional, press Enter to skip): ")?;
        let model = ask(input, &format!("Enter Model Name [{DEFAULT_MODEL}]: "))?;
        let username = ask(
            input,
            &format!("Enter your name to be displayed [{DEFAULT_USERNAME}]: "),
        )?;

        let config = Self {
            api_endpoint: endpoint.unwrap_or_else(default_endpoint),
            api_key,
            model: model.unwrap_or_else(default_model),
            username: username.unwrap_or_else(default_username),
            ..Self::new()
        };
        config.to_file(path)?;
        renderer.print_info(&format!("Configuration saved to {}", path.display()));
        Ok(config)
    }

    fn normalized(mut self) -> Self {
        if self.username.trim().is_empty() {
            self.username = default_username();
        }
        if self.api_key.as_deref().is_some_and(str::is_empty) {
            self.api_key = None;
        }
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The default configuration file location.
///
/// Uses `$XDG_CONFIG_HOME/streamchat/config.yaml`, falling back to
/// `$HOME/.config/streamchat/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => env::var_os("HOME")
            .filter(|dir| !dir.is_empty())
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or_else(|| Error::config("could not determine the home directory"))?,
    };
    Ok(base.join("streamchat").join("config.yaml"))
}

fn ask(input: &mut dyn LineSource, prompt: &str) -> Result<Option<String>> {
    let answer = input.read_line(prompt)?.unwrap_or_default();
    let answer = answer.trim();
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(answer.to_string()))
    }
}

fn create_config_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o750);
    }
    builder
        .create(dir)
        .map_err(|err| Error::io(format!("could not create {}", dir.display()), err))
}
