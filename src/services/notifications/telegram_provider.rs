//! Telegram notification provider implementation.
//!
//! Sends messages through the Bot API `sendMessage` method.
//! Uses the global `HTTP_CLIENT` for connection pooling and efficiency.
//!
//! Bot API Reference: https://core.telegram.org/bots/api#sendmessage

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const PLATFORM: &str = "telegram";

/// Telegram bot bound to one chat
///
/// The token is part of every request URL, so errors are stripped of their URL
/// before they are reported; relayed logs must not leak the token.
///
/// # Example
/// ```ignore
/// let provider = TelegramProvider::new("https://api.telegram.org", "123:ABC", "-100123");
/// provider
///     .send(&NotificationMessage::without_link_preview("Проверена работа"))
///     .await?;
/// ```
#[derive(Clone)]
pub struct TelegramProvider {
    api_url: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    link_preview_options: LinkPreviewOptions,
}

#[derive(Debug, Serialize)]
struct LinkPreviewOptions {
    is_disabled: bool,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
    first_name: String,
}

impl TelegramProvider {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// `{api_url}/bot{token}/{method}`
    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    fn make_error(message: impl Into<String>, source: Option<reqwest::Error>) -> AppError {
        AppError::external(
            PLATFORM,
            message,
            source.map(|e| anyhow::Error::new(e.without_url())),
        )
    }

    fn build_request_body<'a>(&'a self, message: &'a NotificationMessage) -> SendMessageRequest<'a> {
        SendMessageRequest {
            chat_id: &self.chat_id,
            text: &message.body,
            link_preview_options: LinkPreviewOptions {
                is_disabled: message.disable_link_preview,
            },
        }
    }

    /// Unwrap a Bot API envelope, turning `ok: false` into an error
    fn into_result<T>(method: &str, status: u16, response: BotApiResponse<T>) -> AppResult<Option<T>> {
        if !response.ok {
            return Err(Self::make_error(
                format!(
                    "{} rejected with status {}: {}",
                    method,
                    status,
                    response.description.as_deref().unwrap_or("no description")
                ),
                None,
            ));
        }
        Ok(response.result)
    }

    /// Name of the bot behind the token (`getMe`)
    pub async fn bot_name(&self) -> AppResult<String> {
        let response = HTTP_CLIENT
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| Self::make_error("getMe request failed", Some(e)))?;

        let status = response.status().as_u16();
        let envelope: BotApiResponse<BotUser> = response
            .json()
            .await
            .map_err(|e| Self::make_error("getMe returned invalid JSON", Some(e)))?;

        let user = Self::into_result("getMe", status, envelope)?
            .ok_or_else(|| Self::make_error("getMe returned no bot", None))?;
        Ok(user.username.unwrap_or(user.first_name))
    }
}

#[async_trait]
impl NotificationProvider for TelegramProvider {
    /// Sends a notification via `sendMessage`
    ///
    /// # Returns
    /// NotificationResult with HTTP status, message id and duration; an error
    /// when the request fails or Telegram answers `ok: false`
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        let response = HTTP_CLIENT
            .post(self.method_url("sendMessage"))
            .json(&self.build_request_body(message))
            .send()
            .await
            .map_err(|e| Self::make_error("sendMessage request failed", Some(e)))?;

        let status_code = response.status().as_u16();
        let envelope: BotApiResponse<SentMessage> = response
            .json()
            .await
            .map_err(|e| Self::make_error("sendMessage returned invalid JSON", Some(e)))?;

        let sent = Self::into_result("sendMessage", status_code, envelope)?;

        Ok(NotificationResult {
            status_code,
            message_id: sent.map(|m| m.message_id),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Validates telegram configuration
    ///
    /// Checks that:
    /// - the token looks like `<bot id>:<secret>`
    /// - chat_id is not empty
    async fn validate_config(&self) -> AppResult<()> {
        let well_formed = self
            .token
            .split_once(':')
            .is_some_and(|(id, secret)| {
                !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) && !secret.is_empty()
            });
        if !well_formed {
            return Err(AppError::Validation {
                field: "token".to_string(),
                reason: "Bot token must look like '<bot id>:<secret>'".to_string(),
            });
        }

        if self.chat_id.trim().is_empty() {
            return Err(AppError::Validation {
                field: "chat_id".to_string(),
                reason: "Chat id cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TelegramProvider {
        TelegramProvider::new("https://api.telegram.org/", "123456:ABC-DEF", "-100200300")
    }

    #[test]
    fn test_method_url_trims_trailing_slash() {
        assert_eq!(
            provider().method_url("sendMessage"),
            "https://api.telegram.org/bot123456:ABC-DEF/sendMessage"
        );
    }

    #[test]
    fn test_request_body_disables_preview() {
        let provider = provider();
        let message = NotificationMessage::without_link_preview("Проверена работа");

        let body = serde_json::to_value(provider.build_request_body(&message)).unwrap();
        assert_eq!(body["chat_id"], "-100200300");
        assert_eq!(body["text"], "Проверена работа");
        assert_eq!(body["link_preview_options"]["is_disabled"], true);
    }

    #[test]
    fn test_request_body_keeps_preview_for_plain_text() {
        let provider = provider();
        let message = NotificationMessage::text("INFO watcher: started");

        let body = serde_json::to_value(provider.build_request_body(&message)).unwrap();
        assert_eq!(body["link_preview_options"]["is_disabled"], false);
    }

    #[test]
    fn test_successful_envelope() {
        let envelope: BotApiResponse<SentMessage> =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":42,"chat":{"id":1}}}"#)
                .unwrap();
        let sent = TelegramProvider::into_result("sendMessage", 200, envelope).unwrap();
        assert_eq!(sent.map(|m| m.message_id), Some(42));
    }

    #[test]
    fn test_rejected_envelope_is_error() {
        let envelope: BotApiResponse<SentMessage> = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: message text is empty"}"#,
        )
        .unwrap();
        let err = TelegramProvider::into_result("sendMessage", 400, envelope).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("telegram API error"));
        assert!(text.contains("message text is empty"));
        assert!(text.contains("400"));
    }

    #[tokio::test]
    async fn test_validate_config() {
        assert!(provider().validate_config().await.is_ok());

        let bad_token = TelegramProvider::new("https://api.telegram.org", "not-a-token", "1");
        assert!(matches!(
            bad_token.validate_config().await,
            Err(AppError::Validation { ref field, .. }) if field == "token"
        ));

        let no_chat = TelegramProvider::new("https://api.telegram.org", "1:abc", " ");
        assert!(matches!(
            no_chat.validate_config().await,
            Err(AppError::Validation { ref field, .. }) if field == "chat_id"
        ));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // Nothing listens on port 1, so the connection is refused.
        let provider = TelegramProvider::new("http://127.0.0.1:1", "999:SECRET", "1");
        let err = provider
            .send(&NotificationMessage::text("hello"))
            .await
            .unwrap_err();

        let rendered = format!("{:?}", err);
        assert!(!rendered.contains("SECRET"), "token leaked: {}", rendered);
    }
}
