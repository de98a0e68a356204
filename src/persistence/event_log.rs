//! Background task appending bus events to the persistent event log.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::MembershipStore;
use crate::domain::EventBus;

/// Subscribes to `bus` and records every event in `store` until the bus
/// closes.
///
/// Storage failures are logged and skipped; they never block publishers.
pub fn spawn_event_log(bus: &EventBus, store: Arc<dyn MembershipStore>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = store.record_event(&event).await {
                        tracing::warn!(
                            error = %e,
                            event_type = event.event_type_str(),
                            "failed to record event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event log stopped");
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{PoolEvent, PoolId};
    use crate::persistence::InMemoryMembershipStore;
    use chrono::Utc;

    #[tokio::test]
    async fn records_published_events() {
        let bus = EventBus::new(16);
        let store = Arc::new(InMemoryMembershipStore::new());
        let start = Utc::now() - chrono::Duration::seconds(1);
        let handle = spawn_event_log(&bus, Arc::clone(&store) as Arc<dyn MembershipStore>);

        let pool_id = PoolId::new();
        bus.publish(PoolEvent::PoolRemoved {
            pool_id,
            timestamp: Utc::now(),
        });
        drop(bus);
        let _ = handle.await;

        let Ok(events) = store.events_after(start, Some(pool_id)).await else {
            panic!("events_after failed");
        };
        assert_eq!(events.len(), 1);
    }
}
