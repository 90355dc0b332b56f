//! Configuration validation logic
//!
//! Every check reports the dotted path of the offending field so that the
//! operator can find it in `default.toml` or in the matching `WATCHER_*`
//! variable.

use reqwest::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{
    LoggerSettings, NotificationConfig, ReviewApiConfig, Settings, TELEGRAM_MESSAGE_LIMIT,
    TelegramConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::validation(field, format!("Invalid URL '{}': {}", value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::validation(
            field,
            format!("URL must use http or https, got '{}'", url.scheme()),
        ));
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str, hint: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::validation(
            field,
            format!("Value is required. {}", hint),
        ));
    }
    Ok(())
}

impl ReviewApiConfig {
    /// Validate review API configuration
    ///
    /// # Validation Rules
    /// - base_url must be an http(s) URL
    /// - token must be set
    /// - both timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("review_api.base_url", &self.base_url)?;
        require_non_empty(
            "review_api.token",
            &self.token,
            "Set DVMN_TOKEN or WATCHER_REVIEW_API__TOKEN.",
        )?;

        if self.poll_timeout == 0 {
            return Err(ConfigError::validation(
                "review_api.poll_timeout",
                "Long-polling timeout must be greater than 0 seconds.",
            ));
        }

        if self.connect_timeout == 0 {
            return Err(ConfigError::validation(
                "review_api.connect_timeout",
                "Connect timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl TelegramConfig {
    /// Validate Telegram configuration
    ///
    /// # Validation Rules
    /// - api_url must be an http(s) URL
    /// - bot_token and chat_id must be set
    /// - log_bot_token must be set when the relay is enabled
    /// - max_message_length must be within 1..=4096
    pub fn validate(&self, relay_enabled: bool) -> Result<(), ConfigError> {
        validate_http_url("telegram.api_url", &self.api_url)?;
        require_non_empty(
            "telegram.bot_token",
            &self.bot_token,
            "Set TG_BOT_TOKEN or WATCHER_TELEGRAM__BOT_TOKEN.",
        )?;
        require_non_empty(
            "telegram.chat_id",
            &self.chat_id,
            "Set TG_CHAT_ID or WATCHER_TELEGRAM__CHAT_ID.",
        )?;

        if relay_enabled {
            require_non_empty(
                "telegram.log_bot_token",
                &self.log_bot_token,
                "Set TG_LOG_BOT_TOKEN or disable logger.relay_enabled.",
            )?;
        }

        if self.max_message_length == 0 || self.max_message_length > TELEGRAM_MESSAGE_LIMIT {
            return Err(ConfigError::validation(
                "telegram.max_message_length",
                format!(
                    "Must be between 1 and {}, got {}",
                    TELEGRAM_MESSAGE_LIMIT, self.max_message_length
                ),
            ));
        }

        Ok(())
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("notification.lesson_base_url", &self.lesson_base_url)
    }
}

impl LoggerSettings {
    /// Validate logger configuration
    ///
    /// # Validation Rules
    /// - level must be one of trace, debug, info, warn, error
    /// - file format must be one of full, compact, json
    /// - file path must be set when file output is enabled
    /// - at least one of console, file or relay must be enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path cannot be empty when file output is enabled",
            ));
        }

        if !self.console.enabled && !self.file.enabled && !self.relay_enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console, file or relay) must be enabled",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate the whole configuration, stopping at the first invalid field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.review_api.validate()?;
        self.telegram.validate(self.logger.relay_enabled)?;
        self.notification.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
