//! Tests for layered configuration loading.

use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use mcp_chat::config::{ChatConfig, DEFAULT_MODEL};
use mcp_chat::error::ChatError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 5] = [
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "MCP_CHAT_MODEL",
    "MCP_CHAT_MAX_TOKENS",
    "MCP_CHAT_MAX_ROUNDS",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn with_clean_env<T>(f: impl FnOnce() -> T) -> T {
    let _lock = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    f()
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file should be created");
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let config = ChatConfig::default();
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.max_tokens, 1000);
    assert_eq!(config.max_rounds, 10);
    assert!(config.forward_tool_schemas);
    assert!(!config.keep_history);
    assert_eq!(config.model_timeout, Duration::from_secs(120));
    assert_eq!(config.tool_timeout, Duration::from_secs(60));
    assert_eq!(config.model_retries, 0);
    assert!(config.api_key.is_none());
}

#[test]
fn explicit_file_values_are_loaded() {
    let file = config_file(
        r#"
model = "claude-3-haiku-20240307"
max_tokens = 2048
max_rounds = 4
forward_tool_schemas = false
keep_history = true
system_prompt = "Answer briefly."
model_timeout_secs = 30
tool_timeout_secs = 5
model_retries = 2
"#,
    );

    let config = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap();

    assert_eq!(config.model, "claude-3-haiku-20240307");
    assert_eq!(config.max_tokens, 2048);
    assert_eq!(config.max_rounds, 4);
    assert!(!config.forward_tool_schemas);
    assert!(config.keep_history);
    assert_eq!(config.system_prompt.as_deref(), Some("Answer briefly."));
    assert_eq!(config.model_timeout, Duration::from_secs(30));
    assert_eq!(config.tool_timeout, Duration::from_secs(5));
    assert_eq!(config.model_retries, 2);
}

#[test]
fn environment_overrides_file() {
    let file = config_file("model = \"from-file\"\nmax_rounds = 4\n");

    let config = with_clean_env(|| {
        std::env::set_var("MCP_CHAT_MODEL", "from-env");
        std::env::set_var("MCP_CHAT_MAX_ROUNDS", "7");
        std::env::set_var("ANTHROPIC_API_KEY", "sk-env");
        std::env::set_var("ANTHROPIC_BASE_URL", "http://localhost:9999/v1");
        ChatConfig::load(Some(file.path()))
    })
    .unwrap();

    assert_eq!(config.model, "from-env");
    assert_eq!(config.max_rounds, 7);
    assert_eq!(config.require_api_key().unwrap(), "sk-env");
    assert_eq!(config.base_url, "http://localhost:9999/v1");
}

#[test]
fn malformed_file_is_configuration_error() {
    let file = config_file("max_rounds = \"ten\"\n");

    let err = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(_)));
}

#[test]
fn unknown_key_is_configuration_error() {
    let file = config_file("max_round = 3\n");

    let err = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(_)));
}

#[test]
fn missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = with_clean_env(|| ChatConfig::load(Some(path.as_path()))).unwrap_err();
    assert!(matches!(err, ChatError::Io(_)));
}

#[test]
fn zero_rounds_in_file_fails_validation() {
    let file = config_file("max_rounds = 0\n");

    let err = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(ref msg) if msg.contains("max_rounds")));
}

#[test]
fn missing_api_key_is_authentication_error() {
    let file = config_file("");

    let config = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap();
    let err = config.require_api_key().unwrap_err();
    assert!(matches!(err, ChatError::Authentication(ref msg) if msg.contains("ANTHROPIC_API_KEY")));
}

#[test]
fn zero_timeout_in_file_fails_validation() {
    let file = config_file("tool_timeout_secs = 0\n");

    let err = with_clean_env(|| ChatConfig::load(Some(file.path()))).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(ref msg) if msg.contains("tool_timeout_secs")));
}
