//! Relays log records to the operator Telegram bot.
//!
//! [`RelayLayer`] sits in the subscriber stack and turns every event at INFO
//! or above into text. `on_event` is synchronous, so the text is pushed onto a
//! bounded channel and a [`LogRelay`] worker task delivers it through a
//! [`ChunkedSender`]. When the worker falls behind, new records are dropped and
//! counted; the worker reports the count to the operator once it catches up.
//!
//! Delivery failures of the worker are logged under [`RELAY_TARGET`]. The layer
//! drops events with that target, which keeps a broken relay from feeding
//! itself.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::services::notifications::{ChunkedSender, NotificationProvider};

/// Target of records that must never be relayed
pub const RELAY_TARGET: &str = "log_relay";

/// Records waiting for delivery before new ones are dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Shared end of the relay channel; `None` once the relay is closed.
type SharedSender = Arc<Mutex<Option<Sender<String>>>>;

/// `tracing` layer that forwards formatted records to the relay channel
pub struct RelayLayer {
    sender: SharedSender,
    dropped: Arc<AtomicUsize>,
    min_level: Level,
}

/// Receiving side of the relay channel, consumed by [`LogRelay`]
pub struct RelayQueue {
    records: Receiver<String>,
    dropped: Arc<AtomicUsize>,
}

impl RelayQueue {
    /// Records dropped since the last call
    fn take_dropped(&self) -> usize {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl RelayLayer {
    /// Create the layer together with the queue for [`LogRelay`]
    pub fn new() -> (Self, RelayQueue) {
        Self::with_capacity(Level::INFO, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(min_level: Level, capacity: usize) -> (Self, RelayQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let layer = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            dropped: Arc::clone(&dropped),
            min_level,
        };
        (layer, RelayQueue { records: rx, dropped })
    }

    /// Handle that can close the channel after the layer is installed globally
    pub fn closer(&self) -> RelayCloser {
        RelayCloser {
            sender: Arc::clone(&self.sender),
        }
    }

    fn should_relay(&self, metadata: &Metadata<'_>) -> bool {
        // More verbose levels compare greater: TRACE > DEBUG > INFO > WARN > ERROR
        *metadata.level() <= self.min_level && !metadata.target().starts_with(RELAY_TARGET)
    }
}

impl<S: Subscriber> Layer<S> for RelayLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.should_relay(metadata) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let text = visitor.render(metadata);

        if let Ok(guard) = self.sender.lock()
            && let Some(sender) = guard.as_ref()
            && let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(text)
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Closes the relay channel; the worker drains what is queued and stops
#[derive(Clone)]
pub struct RelayCloser {
    sender: SharedSender,
}

impl RelayCloser {
    pub fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}

/// Collects the message and fields of one event
#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl RecordVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name(), value));
        }
    }

    /// `LEVEL target: message`, then one `key: value` line per field
    fn render(self, metadata: &Metadata<'_>) -> String {
        let mut text = format!("{} {}: {}", metadata.level(), metadata.target(), self.message);
        for (name, value) in self.fields {
            let _ = write!(text, "\n{}: {}", name, value);
        }
        text
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut rendered = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            let _ = write!(rendered, "\n  caused by: {}", cause);
            source = cause.source();
        }
        self.push(field, rendered);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

/// Worker that delivers relayed records to the operator chat
pub struct LogRelay<P> {
    sender: ChunkedSender<P>,
}

impl<P: NotificationProvider + 'static> LogRelay<P> {
    pub fn new(sender: ChunkedSender<P>) -> Self {
        Self { sender }
    }

    /// Deliver records until the channel is closed.
    pub async fn run(self, mut queue: RelayQueue) {
        while let Some(record) = queue.records.recv().await {
            self.deliver(&record).await;

            let dropped = queue.take_dropped();
            if dropped > 0 {
                tracing::warn!(target: RELAY_TARGET, dropped, "Relay queue overflowed");
                let notice = format!(
                    "WARN {}: {} log records dropped, relay queue was full",
                    RELAY_TARGET, dropped
                );
                self.deliver(&notice).await;
            }
        }
        tracing::debug!(target: RELAY_TARGET, "Log relay stopped");
    }

    async fn deliver(&self, record: &str) {
        if let Err(e) = self.sender.send_text(record).await {
            tracing::warn!(target: RELAY_TARGET, error = %e, "Failed to relay log record");
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime
    pub fn spawn(self, queue: RelayQueue, closer: RelayCloser) -> RelayHandle {
        RelayHandle {
            closer,
            worker: tokio::spawn(self.run(queue)),
        }
    }
}

/// Owner of the running relay worker
pub struct RelayHandle {
    closer: RelayCloser,
    worker: JoinHandle<()>,
}

impl RelayHandle {
    /// Close the channel and give the worker `grace` to flush queued records.
    pub async fn shutdown(self, grace: Duration) {
        self.closer.close();
        if tokio::time::timeout(grace, self.worker).await.is_err() {
            tracing::warn!(target: RELAY_TARGET, "Log relay did not flush within {:?}", grace);
        }
    }
}
