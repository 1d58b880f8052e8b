//! Configuration loading and validation for autoline.
//!
//! Loads configuration from `~/.autoline/config.toml` with environment
//! variable overrides. Command-line flags are layered on top by the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.autoline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (service default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Shell name, passed to the model as context only
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Prompts estimated above this many tokens are not sent
    #[serde(default = "default_token_ceiling")]
    pub token_ceiling: usize,

    /// History source and per-block row limits
    #[serde(default)]
    pub history: HistoryConfig,

    /// Desktop notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Terminal screen capture
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Log output
    #[serde(default)]
    pub log: LogConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_shell() -> String {
    "nushell".into()
}
fn default_token_ceiling() -> usize {
    3500
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("shell", &self.shell)
            .field("token_ceiling", &self.token_ceiling)
            .field("history", &self.history)
            .field("notifications", &self.notifications)
            .field("capture", &self.capture)
            .field("log", &self.log)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to Atuin's `history.db`
    #[serde(default = "default_atuin_db")]
    pub db_path: PathBuf,

    /// Distinct commands for the same executable (0 disables)
    #[serde(default = "default_block_limit")]
    pub process: usize,

    /// Commands run in the same directory (0 disables)
    #[serde(default = "default_block_limit")]
    pub cwd: usize,

    /// Commands run in the same shell session (0 disables)
    #[serde(default = "default_block_limit")]
    pub session: usize,

    /// Same executable in the same directory (0 disables)
    #[serde(default = "default_cwd_process_limit")]
    pub cwd_process: usize,
}

fn default_atuin_db() -> PathBuf {
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"));
    data_home.join("atuin").join("history.db")
}
fn default_block_limit() -> usize {
    10
}
fn default_cwd_process_limit() -> usize {
    5
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_atuin_db(),
            process: default_block_limit(),
            cwd: default_block_limit(),
            session: default_block_limit(),
            cwd_process: default_cwd_process_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationBackend {
    #[default]
    None,
    Dunst,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub backend: NotificationBackend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackend {
    #[default]
    None,
    Wezterm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub backend: CaptureBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file, truncated on every run. Stdout is reserved for candidates.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    AppConfig::config_dir().join("autoline.log")
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.autoline/config.toml),
    /// then apply environment overrides:
    /// - `AUTOLINE_API_KEY`, then `OPENAI_API_KEY` (when no key is configured)
    /// - `AUTOLINE_API_URL`
    /// - `AUTOLINE_MODEL`
    /// - `ATUIN_HISTORY_DB`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("AUTOLINE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(url) = lookup("AUTOLINE_API_URL") {
            self.api_url = url;
        }
        if let Some(model) = lookup("AUTOLINE_MODEL") {
            self.model = model;
        }
        if let Some(db) = lookup("ATUIN_HISTORY_DB") {
            self.history.db_path = PathBuf::from(db);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".autoline")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ceiling == 0 {
            return Err(ConfigError::ValidationError(
                "token_ceiling must be greater than 0".into(),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: None,
            shell: default_shell(),
            token_ceiling: default_token_ceiling(),
            history: HistoryConfig::default(),
            notifications: NotificationConfig::default(),
            capture: CaptureConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
