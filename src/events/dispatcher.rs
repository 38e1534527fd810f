//! Event Dispatcher Task
//!
//! Background task that drains the engine's event queue and fans each event
//! out through the subscription registry, in emission order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::registry::SubscriptionRegistry;
use super::types::CacheEvent;

/// Spawns the fan-out task.
///
/// The task ends when the sending side of the queue is dropped, which
/// happens once the engine (and therefore every sink clone) is gone.
///
/// # Arguments
/// * `registry` - Shared subscription registry to deliver through
/// * `rx` - Receiving end of the sink queue
pub fn spawn_dispatcher(
    registry: Arc<SubscriptionRegistry>,
    mut rx: mpsc::UnboundedReceiver<CacheEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Event dispatcher started");

        while let Some(event) = rx.recv().await {
            debug!(
                event_type = event.event_type.as_str(),
                key = %event.key,
                "Dispatching event"
            );
            registry.dispatch(&event).await;
        }

        info!("Event dispatcher stopped: queue closed");
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventType;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatcher_forwards_to_subscriber() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = spawn_dispatcher(registry.clone(), event_rx);

        let (client_tx, mut client_rx) = mpsc::unbounded_channel();
        registry.add_client(1, client_tx).await;
        registry.subscribe(1, None).await;

        event_tx.send(CacheEvent::added("k", json!(1))).unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), client_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.event_type, EventType::ItemAdded);
        assert_eq!(received.key, "k");

        drop(event_tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatcher_exits_when_queue_closes() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let (event_tx, event_rx) = mpsc::unbounded_channel::<CacheEvent>();
        let handle = spawn_dispatcher(registry, event_rx);

        drop(event_tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
