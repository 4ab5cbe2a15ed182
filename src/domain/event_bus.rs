//! Broadcast channel for subscriber notices.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Subscription
//! changes and status transitions publish a [`ClassNotice`] through the bus,
//! and every WebSocket session subscribes to receive the notices for its user.

use tokio::sync::broadcast;

use super::ClassNotice;

/// Broadcast bus for [`ClassNotice`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest notices are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClassNotice>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notice to all receivers.
    ///
    /// Returns the number of receivers that got the notice.
    /// If there are no active receivers, the notice is silently dropped.
    pub fn publish(&self, notice: ClassNotice) -> usize {
        self.sender.send(notice).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClassNotice> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
