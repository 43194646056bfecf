//! Broadcast channel for booking updates.
//!
//! [`UpdateBus`] wraps a [`tokio::sync::broadcast`] channel. The booking
//! service and the webhook reconciler publish a [`BookingUpdate`] after
//! each committed change, and every WebSocket connection subscribes.

use tokio::sync::broadcast;

use super::BookingUpdate;

/// Broadcast bus for [`BookingUpdate`]s.
///
/// When the ring buffer is full the oldest updates are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<BookingUpdate>,
}

impl UpdateBus {
    /// Creates a new `UpdateBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an update to all subscribers.
    ///
    /// Returns the number of receivers that got it; with no receivers the
    /// update is dropped.
    pub fn publish(&self, update: BookingUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    /// Creates a new receiver for all future updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookingUpdate> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
