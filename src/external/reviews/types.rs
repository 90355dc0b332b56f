use serde::{Deserialize, Deserializer};
use std::fmt;

/// Position in the review stream, as handed out by the review API.
///
/// The API sends it as a JSON number; it is kept as text and sent back
/// unchanged, never parsed or compared locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Cursor(n.to_string()),
            Raw::Text(s) => Cursor(s),
        })
    }
}

/// One graded submission
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attempt {
    pub lesson_title: String,
    /// Path of the lesson page, relative to the site root
    pub lesson_url: String,
    /// The reviewer sent the work back
    pub is_negative: bool,
}

/// Outcome of one long-polling request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// The server timed out without news
    NoActivity { next_cursor: Cursor },
    /// New reviews arrived, in server order
    Found {
        attempts: Vec<Attempt>,
        next_cursor: Cursor,
    },
}

/// `GET long_polling/` payload
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(super) enum LongPollResponse {
    Timeout {
        timestamp_to_request: Cursor,
    },
    Found {
        new_attempts: Vec<Attempt>,
        last_attempt_timestamp: Cursor,
    },
}

impl From<LongPollResponse> for PollResult {
    fn from(response: LongPollResponse) -> Self {
        match response {
            LongPollResponse::Timeout {
                timestamp_to_request,
            } => PollResult::NoActivity {
                next_cursor: timestamp_to_request,
            },
            LongPollResponse::Found {
                new_attempts,
                last_attempt_timestamp,
            } => PollResult::Found {
                attempts: new_attempts,
                next_cursor: last_attempt_timestamp,
            },
        }
    }
}

/// `GET user_reviews/` payload, newest review first
#[derive(Debug, Deserialize)]
pub(super) struct UserReviewsPage {
    pub results: Vec<UserReview>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserReview {
    pub timestamp: Cursor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_payload() {
        let response: LongPollResponse = serde_json::from_str(
            r#"{"status": "timeout", "timestamp_to_request": 1555609162.25, "request_query": []}"#,
        )
        .unwrap();

        let result = PollResult::from(response);
        assert_eq!(
            result,
            PollResult::NoActivity {
                next_cursor: Cursor::new("1555609162.25")
            }
        );
    }

    #[test]
    fn test_found_payload_keeps_order() {
        let response: LongPollResponse = serde_json::from_str(
            r#"{
                "status": "found",
                "new_attempts": [
                    {"submitted_at": "2019-04-18T20:06:00+03:00", "timestamp": 1555607160.0,
                     "is_negative": true, "lesson_title": "Отправляем уведомления",
                     "lesson_url": "/modules/chat-bots/lesson/devman-bot/"},
                    {"is_negative": false, "lesson_title": "Второй урок",
                     "lesson_url": "/modules/chat-bots/lesson/second/"}
                ],
                "last_attempt_timestamp": 1555607160.0
            }"#,
        )
        .unwrap();

        match PollResult::from(response) {
            PollResult::Found {
                attempts,
                next_cursor,
            } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].lesson_title, "Отправляем уведомления");
                assert!(attempts[0].is_negative);
                assert_eq!(attempts[1].lesson_url, "/modules/chat-bots/lesson/second/");
                assert!(!attempts[1].is_negative);
                assert_eq!(next_cursor, Cursor::new("1555607160.0"));
            }
            other => panic!("Expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_string_cursor_is_kept_verbatim() {
        let response: LongPollResponse =
            serde_json::from_str(r#"{"status": "timeout", "timestamp_to_request": "1555609162.34"}"#)
                .unwrap();
        assert_eq!(
            PollResult::from(response),
            PollResult::NoActivity {
                next_cursor: Cursor::new("1555609162.34")
            }
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<LongPollResponse, _> =
            serde_json::from_str(r#"{"status": "maintenance"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_reviews_page() {
        let page: UserReviewsPage = serde_json::from_str(
            r#"{"count": 2, "next": null, "results": [{"timestamp": 1555493856.5674372}, {"timestamp": 1555000000}]}"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].timestamp.as_str(), "1555000000");
    }
}
