//! Configuration management module for review-watcher
//!
//! This module provides layered configuration loading with support for:
//! - TOML configuration files
//! - Environment variable overrides
//! - The legacy flat credential variables (`DVMN_TOKEN`, `TG_BOT_TOKEN`, ...)
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration (optional)
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local development overrides (not committed to version control)
//! 4. `WATCHER_*` environment variables
//! 5. `DVMN_TOKEN`, `TG_BOT_TOKEN`, `TG_LOG_BOT_TOKEN`, `TG_CHAT_ID`

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

// Re-export public types
pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{NotificationConfig, ReviewApiConfig, Settings, TelegramConfig};
