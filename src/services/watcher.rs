//! The review notification loop.

use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::external::reviews::{Attempt, Cursor, PollError, PollResult, ReviewSource};
use crate::services::notifications::{NotificationMessage, NotificationProvider};

/// Status line for work that was sent back
pub const NEGATIVE_STATUS: &str = "В работе нашлись ошибки, скорее исправляй:";

/// Status line for accepted work
pub const ACCEPTED_STATUS: &str = "Работа сдана, можно приступать к следующему уроку:";

/// Text of the notification for one graded attempt
pub fn build_message(attempt: &Attempt, lesson_base_url: &str) -> String {
    let status = if attempt.is_negative {
        NEGATIVE_STATUS
    } else {
        ACCEPTED_STATUS
    };

    format!(
        "Проверена работа «{}».\n\n{}\n{}{}",
        attempt.lesson_title,
        status,
        lesson_base_url.trim_end_matches('/'),
        attempt.lesson_url
    )
}

/// What one iteration of the loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Transient network failure, the same cursor is polled again
    Retry,
    /// Unexpected failure, logged; the same cursor is polled again
    Failed,
    /// Server timeout without news
    Idle,
    /// This many notifications were delivered
    Notified(usize),
}

/// Polls the review API and notifies the student about every graded attempt.
///
/// The watcher always holds exactly one cursor: the one from the bootstrap
/// call or from the latest successful poll. Failed polls leave it untouched.
pub struct ReviewWatcher<S, N> {
    source: S,
    notifier: N,
    lesson_base_url: String,
    cursor: Cursor,
}

impl<S: ReviewSource, N: NotificationProvider> ReviewWatcher<S, N> {
    /// Start from the newest review on record.
    ///
    /// # Errors
    /// Fails when the review API cannot be reached or the account has no
    /// reviews yet.
    pub async fn bootstrap(
        source: S,
        notifier: N,
        lesson_base_url: impl Into<String>,
    ) -> AppResult<Self> {
        let cursor = source.latest_cursor().await?;
        info!(cursor = %cursor, "Review watcher started");
        Ok(Self::with_cursor(source, notifier, lesson_base_url, cursor))
    }

    /// Start from a known cursor
    pub fn with_cursor(
        source: S,
        notifier: N,
        lesson_base_url: impl Into<String>,
        cursor: Cursor,
    ) -> Self {
        Self {
            source,
            notifier,
            lesson_base_url: lesson_base_url.into(),
            cursor,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Run one poll and react to its result.
    ///
    /// Poll failures are absorbed into the outcome. A failed notification is
    /// returned as an error and the cursor is not advanced.
    pub async fn step(&mut self) -> AppResult<StepOutcome> {
        let result = match self.source.poll(&self.cursor).await {
            Ok(result) => result,
            Err(PollError::Transient(e)) => {
                debug!(error = %e, "Long polling interrupted, polling again");
                return Ok(StepOutcome::Retry);
            }
            Err(PollError::Unexpected(e)) => {
                error!(cursor = %self.cursor, "Review polling failed: {:?}", e);
                return Ok(StepOutcome::Failed);
            }
        };

        match result {
            PollResult::NoActivity { next_cursor } => {
                debug!(cursor = %next_cursor, "No new reviews");
                self.cursor = next_cursor;
                Ok(StepOutcome::Idle)
            }
            PollResult::Found {
                attempts,
                next_cursor,
            } => {
                for attempt in &attempts {
                    let text = build_message(attempt, &self.lesson_base_url);
                    self.notifier
                        .send(&NotificationMessage::without_link_preview(text))
                        .await?;
                    info!(
                        lesson = %attempt.lesson_title,
                        negative = attempt.is_negative,
                        "Review notification sent"
                    );
                }
                self.cursor = next_cursor;
                Ok(StepOutcome::Notified(attempts.len()))
            }
        }
    }

    /// Poll until a notification cannot be delivered.
    pub async fn run(&mut self) -> AppResult<()> {
        loop {
            self.step().await?;
        }
    }

    /// Like [`run`](Self::run) but stops after `max_iterations` polls.
    ///
    /// Returns the number of notifications delivered.
    pub async fn run_for(&mut self, max_iterations: u64) -> AppResult<usize> {
        let mut delivered = 0;
        for _ in 0..max_iterations {
            if let StepOutcome::Notified(n) = self.step().await? {
                delivered += n;
            }
        }
        info!(
            iterations = max_iterations,
            delivered, "Review watcher reached the iteration limit"
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::notifications::testing::RecordingProvider;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://dvmn.org";

    /// Replays scripted poll results and records the cursors it was asked for
    #[derive(Clone, Default)]
    struct ScriptedSource {
        latest: Option<&'static str>,
        script: Arc<Mutex<VecDeque<Result<PollResult, PollError>>>>,
        polled: Arc<Mutex<Vec<Cursor>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PollResult, PollError>>) -> Self {
            Self {
                latest: Some("100.5"),
                script: Arc::new(Mutex::new(script.into())),
                polled: Arc::default(),
            }
        }

        fn polled(&self) -> Vec<String> {
            self.polled
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl ReviewSource for ScriptedSource {
        async fn latest_cursor(&self) -> AppResult<Cursor> {
            self.latest
                .map(Cursor::new)
                .ok_or_else(|| AppError::external("dvmn", "user_reviews returned no reviews", None))
        }

        async fn poll(&self, cursor: &Cursor) -> Result<PollResult, PollError> {
            self.polled.lock().unwrap().push(cursor.clone());
            self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(PollResult::NoActivity {
                    next_cursor: cursor.clone(),
                })
            })
        }
    }

    fn attempt(title: &str, url: &str, is_negative: bool) -> Attempt {
        Attempt {
            lesson_title: title.to_string(),
            lesson_url: url.to_string(),
            is_negative,
        }
    }

    fn transient() -> Result<PollResult, PollError> {
        Err(PollError::Transient(anyhow::anyhow!("operation timed out")))
    }

    fn watcher(
        source: &ScriptedSource,
        notifier: &RecordingProvider,
    ) -> ReviewWatcher<ScriptedSource, RecordingProvider> {
        ReviewWatcher::with_cursor(source.clone(), notifier.clone(), BASE, Cursor::new("100.5"))
    }

    #[test]
    fn test_negative_message() {
        let text = build_message(
            &attempt("Отправляем уведомления", "/modules/chat-bots/lesson/devman-bot/", true),
            BASE,
        );
        assert_eq!(
            text,
            "Проверена работа «Отправляем уведомления».\n\n\
             В работе нашлись ошибки, скорее исправляй:\n\
             https://dvmn.org/modules/chat-bots/lesson/devman-bot/"
        );
    }

    #[test]
    fn test_accepted_message() {
        let text = build_message(&attempt("Урок", "/lesson/", false), "https://dvmn.org/");
        assert!(text.contains(ACCEPTED_STATUS));
        assert!(!text.contains(NEGATIVE_STATUS));
        assert!(text.ends_with("\nhttps://dvmn.org/lesson/"));
    }

    #[tokio::test]
    async fn test_bootstrap_takes_latest_cursor() {
        let source = ScriptedSource::new(vec![]);
        let watcher = ReviewWatcher::bootstrap(source, RecordingProvider::default(), BASE)
            .await
            .unwrap();
        assert_eq!(watcher.cursor().as_str(), "100.5");
    }

    #[tokio::test]
    async fn test_bootstrap_without_reviews_fails() {
        let source = ScriptedSource {
            latest: None,
            ..ScriptedSource::default()
        };
        let result = ReviewWatcher::bootstrap(source, RecordingProvider::default(), BASE).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_cursor_and_retries() {
        let source = ScriptedSource::new(vec![transient(), transient()]);
        let notifier = RecordingProvider::default();
        let mut watcher = watcher(&source, &notifier);

        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Retry);
        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Retry);
        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Idle);

        assert_eq!(source.polled(), vec!["100.5", "100.5", "100.5"]);
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_failure_keeps_cursor() {
        let source = ScriptedSource::new(vec![Err(PollError::Unexpected(anyhow::anyhow!(
            "HTTP status server error (502 Bad Gateway)"
        )))]);
        let notifier = RecordingProvider::default();
        let mut watcher = watcher(&source, &notifier);

        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Failed);
        assert_eq!(watcher.cursor().as_str(), "100.5");
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_no_activity_advances_cursor() {
        let source = ScriptedSource::new(vec![Ok(PollResult::NoActivity {
            next_cursor: Cursor::new("200.25"),
        })]);
        let notifier = RecordingProvider::default();
        let mut watcher = watcher(&source, &notifier);

        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Idle);
        watcher.step().await.unwrap();

        assert_eq!(source.polled(), vec!["100.5", "200.25"]);
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_found_sends_one_message_per_attempt() {
        let source = ScriptedSource::new(vec![Ok(PollResult::Found {
            attempts: vec![
                attempt("Первый", "/lesson/one/", true),
                attempt("Второй", "/lesson/two/", false),
            ],
            next_cursor: Cursor::new("300.0"),
        })]);
        let notifier = RecordingProvider::default();
        let mut watcher = watcher(&source, &notifier);

        assert_eq!(watcher.step().await.unwrap(), StepOutcome::Notified(2));
        assert_eq!(watcher.cursor().as_str(), "300.0");

        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.disable_link_preview));
        assert!(messages[0].body.contains("«Первый»"));
        assert!(messages[0].body.contains(NEGATIVE_STATUS));
        assert!(messages[0].body.contains("https://dvmn.org/lesson/one/"));
        assert!(messages[1].body.contains("«Второй»"));
        assert!(messages[1].body.contains(ACCEPTED_STATUS));
        assert!(messages[1].body.contains("https://dvmn.org/lesson/two/"));
    }

    #[tokio::test]
    async fn test_send_failure_stops_without_advancing() {
        let source = ScriptedSource::new(vec![Ok(PollResult::Found {
            attempts: vec![attempt("Первый", "/one/", false), attempt("Второй", "/two/", false)],
            next_cursor: Cursor::new("300.0"),
        })]);
        let notifier = RecordingProvider::failing_after(1);
        let mut watcher = watcher(&source, &notifier);

        let result = watcher.run().await;

        assert!(matches!(result, Err(AppError::ExternalApi { .. })));
        assert_eq!(watcher.cursor().as_str(), "100.5");
        assert_eq!(notifier.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_run_for_stops_after_limit() {
        let source = ScriptedSource::new(vec![
            transient(),
            Ok(PollResult::Found {
                attempts: vec![attempt("Урок", "/lesson/", false)],
                next_cursor: Cursor::new("400.0"),
            }),
        ]);
        let notifier = RecordingProvider::default();
        let mut watcher = watcher(&source, &notifier);

        let delivered = watcher.run_for(4).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(source.polled(), vec!["100.5", "100.5", "400.0", "400.0"]);
    }
}
