//! Configuration system (layered: defaults < config file < env < CLI flags).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ChatError;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const CONFIG_FILE_NAME: &str = "mcp-chat.toml";

/// Resolved configuration for one chat session.
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_rounds: usize,
    pub forward_tool_schemas: bool,
    pub keep_history: bool,
    pub system_prompt: Option<String>,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    pub model_retries: u32,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_rounds", &self.max_rounds)
            .field("forward_tool_schemas", &self.forward_tool_schemas)
            .field("keep_history", &self.keep_history)
            .field("system_prompt", &self.system_prompt)
            .field("model_timeout", &self.model_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("model_retries", &self.model_retries)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            max_rounds: 10,
            forward_tool_schemas: true,
            keep_history: false,
            system_prompt: None,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
            model_retries: 0,
        }
    }
}

/// On-disk representation; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_rounds: Option<usize>,
    pub forward_tool_schemas: Option<bool>,
    pub keep_history: Option<bool>,
    pub system_prompt: Option<String>,
    pub model_timeout_secs: Option<u64>,
    pub tool_timeout_secs: Option<u64>,
    pub model_retries: Option<u32>,
}

impl ConfigFile {
    /// Read and parse a TOML config file.
    pub fn read(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw).map_err(|e| {
            ChatError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

impl ChatConfig {
    /// Resolve configuration from an optional file and the process environment.
    ///
    /// An explicit `path` must exist. Without one, the platform config file is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ChatError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        match path {
            Some(path) => config.apply_file(ConfigFile::read(path)?),
            None => {
                if let Some(default_path) = default_config_path().filter(|p| p.is_file()) {
                    tracing::debug!(path = %default_path.display(), "loading config file");
                    config.apply_file(ConfigFile::read(&default_path)?);
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values present in a config file.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(url) = file.base_url {
            self.base_url = url;
        }
        if let Some(max_tokens) = file.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(max_rounds) = file.max_rounds {
            self.max_rounds = max_rounds;
        }
        if let Some(forward) = file.forward_tool_schemas {
            self.forward_tool_schemas = forward;
        }
        if let Some(keep) = file.keep_history {
            self.keep_history = keep;
        }
        if file.system_prompt.is_some() {
            self.system_prompt = file.system_prompt;
        }
        if let Some(secs) = file.model_timeout_secs {
            self.model_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.tool_timeout_secs {
            self.tool_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = file.model_retries {
            self.model_retries = retries;
        }
    }

    /// Overlay environment variables, read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ChatError> {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("MCP_CHAT_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("MCP_CHAT_MAX_TOKENS") {
            self.max_tokens = parse_env("MCP_CHAT_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("MCP_CHAT_MAX_ROUNDS") {
            self.max_rounds = parse_env("MCP_CHAT_MAX_ROUNDS", &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_rounds == 0 {
            return Err(ChatError::Configuration(
                "max_rounds must be at least 1".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ChatError::Configuration(
                "max_tokens must be at least 1".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::Configuration("model must not be empty".into()));
        }
        if self.model_timeout.is_zero() {
            return Err(ChatError::Configuration(
                "model_timeout_secs must be at least 1".into(),
            ));
        }
        if self.tool_timeout.is_zero() {
            return Err(ChatError::Configuration(
                "tool_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The API key, or an authentication error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ChatError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ChatError::Authentication("Missing ANTHROPIC_API_KEY".into()))
    }
}

/// Platform config location, e.g. `~/.config/mcp-chat/mcp-chat.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mcp-chat")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ChatError> {
    raw.trim()
        .parse()
        .map_err(|_| ChatError::Configuration(format!("{name} has invalid value '{raw}'")))
}
