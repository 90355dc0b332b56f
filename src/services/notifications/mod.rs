//! Notification system with pluggable providers.
//!
//! The core trait `NotificationProvider` hides the messenger; Telegram is the
//! only real implementation. `ChunkedSender` layers length-aware splitting on
//! top of any provider.

mod chunking;
mod provider;
mod telegram_provider;

#[cfg(test)]
pub(crate) mod testing;

pub use chunking::{Chunk, ChunkedSender, split_message};
pub use provider::{NotificationMessage, NotificationProvider, NotificationResult};
pub use telegram_provider::TelegramProvider;
