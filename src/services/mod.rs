//! Service layer for the watcher's business logic.
//!
//! Services coordinate the review API client and the notification providers.

pub mod notifications;
pub mod watcher;

pub use notifications::{ChunkedSender, NotificationProvider, TelegramProvider};
pub use watcher::{ReviewWatcher, StepOutcome, build_message};
