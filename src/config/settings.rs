//! Configuration settings structures for review-watcher
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "review-watcher".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_review_api_url() -> String {
    "https://dvmn.org/api".to_string()
}

fn default_poll_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_max_message_length() -> usize {
    TELEGRAM_MESSAGE_LIMIT
}

fn default_lesson_base_url() -> String {
    "https://dvmn.org".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/review-watcher.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Hard limit of the Telegram `sendMessage` text field
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Review API Configuration
// ============================================================================

/// dvmn.org review API configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewApiConfig {
    /// API root, endpoints are appended to it
    #[serde(default = "default_review_api_url")]
    pub base_url: String,

    /// Personal API token (`Authorization: Token ...`)
    #[serde(default)]
    pub token: String,

    /// Client-side timeout for one long-polling request in seconds.
    /// Must outlast the server hold period, otherwise every poll times out.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl ReviewApiConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for ReviewApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_review_api_url(),
            token: String::new(),
            poll_timeout: default_poll_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl std::fmt::Debug for ReviewApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &redact(&self.token))
            .field("poll_timeout", &self.poll_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// ============================================================================
// Telegram Configuration
// ============================================================================

/// Telegram Bot API configuration
///
/// Two bots share one chat: `bot_token` talks to the student, `log_bot_token`
/// carries the relayed diagnostics.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API root
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Token of the bot that sends review notifications
    #[serde(default)]
    pub bot_token: String,

    /// Token of the bot that receives relayed log records
    #[serde(default)]
    pub log_bot_token: String,

    /// Target chat id (numeric id or `@channel` username)
    #[serde(default)]
    pub chat_id: String,

    /// Maximum characters per message before the relay splits text
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_telegram_api_url(),
            bot_token: String::new(),
            log_bot_token: String::new(),
            chat_id: String::new(),
            max_message_length: default_max_message_length(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &redact(&self.bot_token))
            .field("log_bot_token", &redact(&self.log_bot_token))
            .field("chat_id", &self.chat_id)
            .field("max_message_length", &self.max_message_length)
            .finish()
    }
}

// ============================================================================
// Notification Configuration
// ============================================================================

/// Review notification rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Host prepended to the lesson path of every attempt
    #[serde(default = "default_lesson_base_url")]
    pub lesson_base_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            lesson_base_url: default_lesson_base_url(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,

    /// Forward INFO and above to the operator Telegram bot
    #[serde(default = "default_true")]
    pub relay_enabled: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
            relay_enabled: default_true(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime [`LoggerConfig`]
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level, self.relay_enabled)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format)
            .map_err(|e| ConfigError::validation("logger.file", e.to_string()))
    }
}

// ============================================================================
// Root Settings
// ============================================================================

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// dvmn review API
    #[serde(default)]
    pub review_api: ReviewApiConfig,

    /// Telegram bots and target chat
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Notification rendering
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}
