use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;

use super::error::PollError;
use super::provider::ReviewSource;
use super::types::{Cursor, LongPollResponse, PollResult, UserReviewsPage};
use crate::config::ReviewApiConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::build_client;

const PLATFORM: &str = "dvmn";

/// Longest payload excerpt kept in decode errors
const PAYLOAD_EXCERPT: usize = 200;

/// HTTP client of the dvmn.org review API
///
/// Owns a dedicated `reqwest::Client` whose timeout is the long-polling
/// timeout, so the shared short-call client is never held for minutes.
pub struct DvmnClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl DvmnClient {
    pub fn new(config: &ReviewApiConfig) -> AppResult<Self> {
        let client = build_client(config.poll_timeout(), config.connect_timeout()).map_err(|e| {
            AppError::external(PLATFORM, "failed to build HTTP client", Some(e.into()))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    /// `{base_url}/{name}/`
    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.base_url, name)
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::external(PLATFORM, message, source)
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(PAYLOAD_EXCERPT) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[async_trait]
impl ReviewSource for DvmnClient {
    async fn latest_cursor(&self) -> AppResult<Cursor> {
        let response = self
            .client
            .get(self.endpoint("user_reviews"))
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::make_error("user_reviews request failed", Some(e.into())))?;

        let page: UserReviewsPage = response
            .json()
            .await
            .map_err(|e| Self::make_error("user_reviews returned invalid JSON", Some(e.into())))?;

        page.results
            .into_iter()
            .next()
            .map(|review| review.timestamp)
            .ok_or_else(|| Self::make_error("user_reviews returned no reviews", None))
    }

    async fn poll(&self, cursor: &Cursor) -> Result<PollResult, PollError> {
        let url = Url::parse_with_params(
            &self.endpoint("long_polling"),
            &[("timestamp", cursor.as_str())],
        )
        .context("invalid long_polling URL")
        .map_err(PollError::Unexpected)?;

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let payload: LongPollResponse = serde_json::from_str(&body)
            .with_context(|| format!("unexpected long_polling payload: {}", excerpt(&body)))
            .map_err(PollError::Unexpected)?;

        Ok(payload.into())
    }
}
