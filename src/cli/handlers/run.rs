//! Run command handler
//!
//! Handles the run command including dry-run validation and the watch loop.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::external::reviews::DvmnClient;
use crate::services::notifications::{NotificationProvider, TelegramProvider};
use crate::services::watcher::ReviewWatcher;

/// Handler for the run command
pub struct RunCommandHandler {
    config: Settings,
}

impl RunCommandHandler {
    /// Create a new run command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the run command
    ///
    /// # Arguments
    /// * `dry_run` - If true, validates configuration and exits without polling
    /// * `max_iterations` - Stop after this many polls instead of running forever
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Bootstrap failures (review API unreachable, no reviews yet)
    /// - A review notification that Telegram did not accept
    pub async fn execute(&self, dry_run: bool, max_iterations: Option<u64>) -> AppResult<()> {
        if dry_run {
            return self.validate_only().await;
        }

        let telegram = &self.config.telegram;
        let notifier = TelegramProvider::new(&telegram.api_url, &telegram.bot_token, &telegram.chat_id);
        notifier.validate_config().await?;

        let source = DvmnClient::new(&self.config.review_api)?;
        let mut watcher =
            ReviewWatcher::bootstrap(source, notifier, &self.config.notification.lesson_base_url)
                .await?;

        match max_iterations {
            Some(limit) => watcher.run_for(limit).await.map(|_| ()),
            None => watcher.run().await,
        }
    }

    /// Validate configuration without contacting any API
    pub async fn validate_only(&self) -> AppResult<()> {
        self.validate_configuration()?;

        let telegram = &self.config.telegram;
        TelegramProvider::new(&telegram.api_url, &telegram.bot_token, &telegram.chat_id)
            .validate_config()
            .await?;
        if self.config.logger.relay_enabled {
            TelegramProvider::new(&telegram.api_url, &telegram.log_bot_token, &telegram.chat_id)
                .validate_config()
                .await?;
        }

        println!("✓ Configuration is valid");
        println!("✓ Review API: {}", self.config.review_api.base_url);
        println!(
            "✓ Long polling timeout: {}s",
            self.config.review_api.poll_timeout
        );
        println!("✓ Notifications go to chat {}", telegram.chat_id);
        if self.config.logger.relay_enabled {
            println!(
                "✓ Logs are relayed in chunks of up to {} characters",
                telegram.max_message_length
            );
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Validate the current configuration
    fn validate_configuration(&self) -> AppResult<()> {
        self.config.validate().map_err(|e| e.into())
    }
}
