//! In-process bus for administrative change-log entries.
//!
//! [`AdminEventBus`] is shared via `Arc<AdminEventBus>`. The host publishes an
//! [`AdminLogEntry`] whenever it persists one; the
//! [`AdminEventListener`](crate::listener::AdminEventListener) consumes them.

use tokio::sync::broadcast;

use crate::entry::AdminLogEntry;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus backed by a [`broadcast::Sender`].
pub struct AdminEventBus {
    sender: broadcast::Sender<AdminLogEntry>,
}

impl AdminEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed entries are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an entry to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it; zero means the
    /// entry was dropped.
    pub fn publish(&self, entry: AdminLogEntry) -> usize {
        self.sender.send(entry).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdminLogEntry> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AdminEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
