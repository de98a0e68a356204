//! Broadcast channel for pool events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every committed
//! membership or definition change publishes a [`PoolEvent`]; WebSocket
//! connections and the event log subscribe to it.

use tokio::sync::broadcast;

use super::PoolEvent;

/// Broadcast bus for [`PoolEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event; zero when
    /// nobody listens.
    pub fn publish(&self, event: PoolEvent) -> usize {
        tracing::trace!(event_type = event.event_type_str(), pool_id = %event.pool_id(), "publish");
        self.sender.send(event).unwrap_or(0)
    }

    /// Publishes a batch of events in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = PoolEvent>) {
        for event in events {
            let _ = self.publish(event);
        }
    }

    /// Creates a new receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PoolId;
    use chrono::Utc;

    fn removed(pool_id: PoolId) -> PoolEvent {
        PoolEvent::PoolRemoved {
            pool_id,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(removed(PoolId::new())), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_batches_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let first = PoolId::new();
        let second = PoolId::new();
        bus.publish_all([removed(first), removed(second)]);

        let Ok(a) = rx.recv().await else {
            panic!("expected first event");
        };
        let Ok(b) = rx.recv().await else {
            panic!("expected second event");
        };
        assert_eq!(a.pool_id(), first);
        assert_eq!(b.pool_id(), second);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(removed(PoolId::new())), 1);
    }
}
