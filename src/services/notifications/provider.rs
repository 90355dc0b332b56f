//! Core notification provider trait and types.
//!
//! This module provides the abstraction for notification providers. The
//! watcher and the log relay only see this trait, so tests can swap the
//! Telegram bot for an in-memory recorder.

use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message to be sent via notification provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message body/content (required)
    pub body: String,
    /// Ask the messenger not to render a preview for links in the body
    pub disable_link_preview: bool,
}

impl NotificationMessage {
    /// Plain text message with link previews left to the messenger
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            disable_link_preview: false,
        }
    }

    /// Plain text message without link previews
    pub fn without_link_preview(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            disable_link_preview: true,
        }
    }
}

/// Result of a delivered notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// HTTP status code or provider-specific status
    pub status_code: u16,
    /// Provider-side id of the created message, if reported
    pub message_id: Option<i64>,
    /// Time taken for the operation in milliseconds
    pub duration_ms: u64,
}

/// Trait for notification providers
///
/// Unlike a fire-and-forget webhook, a failed delivery is an `Err`: callers
/// decide whether that is fatal (review notifications) or only worth a log
/// line (relayed diagnostics).
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Sends a notification message
    ///
    /// # Returns
    /// Delivery details on success, `AppError::ExternalApi` when the message
    /// was not accepted
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult>;

    /// Validates provider configuration (optional, default no-op)
    async fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }
}
