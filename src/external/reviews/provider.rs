use super::error::PollError;
use super::types::{Cursor, PollResult};
use crate::error::AppResult;
use async_trait::async_trait;

/// Source of review results
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Cursor of the most recent review on record (`user_reviews/`)
    ///
    /// Fails when the account has no reviews yet.
    async fn latest_cursor(&self) -> AppResult<Cursor>;

    /// One long-polling request starting at `cursor`
    async fn poll(&self, cursor: &Cursor) -> Result<PollResult, PollError>;
}
