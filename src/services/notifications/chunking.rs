//! Splitting long text into messenger-sized pieces.

use super::provider::{NotificationMessage, NotificationProvider};
use crate::error::AppResult;

/// One piece of split text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// The cut consumed a newline right after this chunk
    pub split_at_newline: bool,
}

/// Split `text` into chunks of at most `limit` characters.
///
/// While the rest does not fit, the first `limit` characters are examined: if
/// they contain a newline the cut happens at the last one and the newline is
/// dropped, otherwise the cut happens at exactly `limit` characters. Limits are
/// counted in `char`s, never splitting a code point. Empty text yields no
/// chunks.
pub fn split_message(text: &str, limit: usize) -> Vec<Chunk> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some((boundary, _)) = remaining.char_indices().nth(limit) else {
            chunks.push(Chunk {
                text: remaining.to_string(),
                split_at_newline: false,
            });
            break;
        };

        let head = &remaining[..boundary];
        match head.rfind('\n') {
            Some(newline) => {
                chunks.push(Chunk {
                    text: head[..newline].to_string(),
                    split_at_newline: true,
                });
                remaining = &remaining[newline + 1..];
            }
            None => {
                chunks.push(Chunk {
                    text: head.to_string(),
                    split_at_newline: false,
                });
                remaining = &remaining[boundary..];
            }
        }
    }

    chunks
}

/// Sends arbitrarily long text as a series of messages
pub struct ChunkedSender<P> {
    provider: P,
    limit: usize,
}

impl<P: NotificationProvider> ChunkedSender<P> {
    pub fn new(provider: P, limit: usize) -> Self {
        Self {
            provider,
            limit: limit.max(1),
        }
    }

    /// Send every chunk of `text` in order and return how many messages went out.
    ///
    /// Chunks that are empty or whitespace-only are skipped: Telegram trims
    /// the text and rejects a message with nothing left. The first failed
    /// delivery aborts the rest; nothing is retried.
    pub async fn send_text(&self, text: &str) -> AppResult<usize> {
        let mut sent = 0;
        for chunk in split_message(text, self.limit) {
            if chunk.text.trim().is_empty() {
                continue;
            }
            self.provider
                .send(&NotificationMessage::text(chunk.text))
                .await?;
            sent += 1;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifications::testing::RecordingProvider;
    use proptest::prelude::*;

    fn rejoin(chunks: &[Chunk]) -> String {
        let mut text = String::new();
        for chunk in chunks {
            text.push_str(&chunk.text);
            if chunk.split_at_newline {
                text.push('\n');
            }
        }
        text
    }

    fn lengths(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.text.chars().count()).collect()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_message("hello\nworld", 4096);
        assert_eq!(
            chunks,
            vec![Chunk {
                text: "hello\nworld".to_string(),
                split_at_newline: false
            }]
        );
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(split_message("", 4096).is_empty());
    }

    #[test]
    fn test_text_without_newlines_is_cut_at_limit() {
        let text = "a".repeat(5000);
        let chunks = split_message(&text, 4096);
        assert_eq!(lengths(&chunks), vec![4096, 904]);
        assert!(chunks.iter().all(|c| !c.split_at_newline));
    }

    #[test]
    fn test_cut_at_last_newline_inside_limit() {
        let mut text = "x".repeat(4090);
        text.push('\n');
        text.push_str(&"y".repeat(3000));

        let chunks = split_message(&text, 4096);
        assert_eq!(lengths(&chunks), vec![4090, 3000]);
        assert!(chunks[0].split_at_newline);
        assert_eq!(chunks[1].text, text[4091..]);
    }

    #[test]
    fn test_last_of_several_newlines_wins() {
        let chunks = split_message("ab\ncd\nefgh", 8);
        assert_eq!(chunks[0].text, "ab\ncd");
        assert_eq!(chunks[1].text, "efgh");
    }

    #[test]
    fn test_leading_newline_produces_empty_chunk() {
        let chunks = split_message("\nabcdef", 3);
        assert_eq!(chunks[0].text, "");
        assert!(chunks[0].split_at_newline);
        assert_eq!(rejoin(&chunks), "\nabcdef");
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let text = "ж".repeat(10);
        let chunks = split_message(&text, 4);
        assert_eq!(lengths(&chunks), vec![4, 4, 2]);
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn test_zero_limit_is_treated_as_one() {
        let chunks = split_message("abc", 0);
        assert_eq!(lengths(&chunks), vec![1, 1, 1]);
    }

    proptest! {
        #[test]
        fn property_chunks_fit_and_rejoin(text in "[ab\n]{0,300}", limit in 1usize..40) {
            let chunks = split_message(&text, limit);
            for chunk in &chunks {
                prop_assert!(chunk.text.chars().count() <= limit);
            }
            prop_assert_eq!(rejoin(&chunks), text);
        }

        #[test]
        fn property_unicode_chunks_rejoin(text in "[а-яё \n]{0,200}", limit in 1usize..16) {
            let chunks = split_message(&text, limit);
            for chunk in &chunks {
                prop_assert!(chunk.text.chars().count() <= limit);
            }
            prop_assert_eq!(rejoin(&chunks), text);
        }
    }

    #[tokio::test]
    async fn test_sender_delivers_chunks_in_order() {
        let provider = RecordingProvider::default();
        let sender = ChunkedSender::new(provider.clone(), 5);

        let sent = sender.send_text("one\ntwo\nthree\nfour").await.unwrap();

        assert_eq!(sent, 4);
        assert_eq!(provider.bodies(), vec!["one", "two", "three", "\nfour"]);
    }

    #[tokio::test]
    async fn test_sender_skips_blank_chunks() {
        let provider = RecordingProvider::default();
        let sender = ChunkedSender::new(provider.clone(), 3);

        let sent = sender.send_text("\nabc").await.unwrap();

        assert_eq!(sent, 1);
        assert_eq!(provider.bodies(), vec!["abc"]);
    }

    #[tokio::test]
    async fn test_sender_skips_whitespace_only_chunks() {
        let provider = RecordingProvider::default();
        let sender = ChunkedSender::new(provider.clone(), 4);

        let sent = sender.send_text("abcd  
 
efgh").await.unwrap();

        assert_eq!(sent, 2);
        assert_eq!(provider.bodies(), vec!["abcd", "efgh"]);
    }

    #[tokio::test]
    async fn test_sender_empty_text_is_noop() {
        let provider = RecordingProvider::default();
        let sender = ChunkedSender::new(provider.clone(), 4096);

        assert_eq!(sender.send_text("").await.unwrap(), 0);
        assert_eq!(provider.attempts(), 0);
    }

    #[tokio::test]
    async fn test_sender_stops_at_first_failure() {
        let provider = RecordingProvider::failing_after(1);
        let sender = ChunkedSender::new(provider.clone(), 4);

        let result = sender.send_text("aaaabbbbcccc").await;

        assert!(result.is_err());
        assert_eq!(provider.bodies(), vec!["aaaa"]);
        assert_eq!(provider.attempts(), 2);
    }
}
