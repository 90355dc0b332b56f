//! In-memory provider for tests.

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorded {
    delivered: Vec<NotificationMessage>,
    attempts: usize,
}

/// Records delivered messages; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    inner: Arc<Mutex<Recorded>>,
    fail_after: Option<usize>,
}

impl RecordingProvider {
    /// Accepts the first `successes` messages and rejects every later one
    pub fn failing_after(successes: usize) -> Self {
        Self {
            inner: Arc::default(),
            fail_after: Some(successes),
        }
    }

    pub fn messages(&self) -> Vec<NotificationMessage> {
        self.inner.lock().unwrap().delivered.clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.body).collect()
    }

    /// Delivered plus rejected sends
    pub fn attempts(&self) -> usize {
        self.inner.lock().unwrap().attempts
    }
}

#[async_trait]
impl NotificationProvider for RecordingProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let mut recorded = self.inner.lock().unwrap();
        recorded.attempts += 1;

        if self.fail_after.is_some_and(|n| recorded.delivered.len() >= n) {
            return Err(AppError::external("recording", "delivery rejected", None));
        }

        recorded.delivered.push(message.clone());
        Ok(NotificationResult {
            status_code: 200,
            message_id: Some(recorded.delivered.len() as i64),
            duration_ms: 0,
        })
    }
}
