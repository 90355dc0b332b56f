//! Check command handler
//!
//! Talks to every configured API once and reports what it found.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::external::reviews::{DvmnClient, ReviewSource};
use crate::services::notifications::TelegramProvider;

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Fetch the current review cursor and the names of the bots
    ///
    /// # Errors
    /// The first API call that fails
    pub async fn execute(&self) -> AppResult<()> {
        let source = DvmnClient::new(&self.config.review_api)?;
        let cursor = source.latest_cursor().await?;
        println!("✓ Review API token accepted");
        println!("✓ Current review cursor: {}", cursor);

        let telegram = &self.config.telegram;
        let notifier = TelegramProvider::new(&telegram.api_url, &telegram.bot_token, &telegram.chat_id);
        println!("✓ Notification bot: @{}", notifier.bot_name().await?);

        if self.config.logger.relay_enabled {
            let relay =
                TelegramProvider::new(&telegram.api_url, &telegram.log_bot_token, &telegram.chat_id);
            println!("✓ Log relay bot: @{}", relay.bot_name().await?);
        }

        Ok(())
    }
}
