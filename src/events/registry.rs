//! Subscription Registry Module
//!
//! Tracks which connected client wants which event types and fans committed
//! events out to their delivery queues.
//!
//! Delivery is push-onto-queue only: a slow client cannot stall the
//! dispatcher or other clients. A queue whose receiving session is gone is
//! pruned on the next dispatch.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::types::{CacheEvent, EventType};

// == Client Subscription ==
/// Per-client filter set and delivery queue.
#[derive(Debug)]
struct ClientSubscription {
    /// Event types this client wants; empty means "nothing"
    subscribed_events: HashSet<EventType>,
    /// Queue drained by the client's notification writer task
    sender: mpsc::UnboundedSender<CacheEvent>,
}

// == Subscription Registry ==
/// Shared map of connected clients and their event filters.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    clients: RwLock<HashMap<u64, ClientSubscription>>,
}

impl SubscriptionRegistry {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Add Client ==
    /// Registers a client with an empty filter set.
    pub async fn add_client(&self, client_id: u64, sender: mpsc::UnboundedSender<CacheEvent>) {
        let mut clients = self.clients.write().await;
        clients.insert(
            client_id,
            ClientSubscription {
                subscribed_events: HashSet::new(),
                sender,
            },
        );
        debug!(client_id, "Client registered");
    }

    // == Subscribe ==
    /// Replaces a client's filter set.
    ///
    /// `None` means "every event type"; `Some` replaces the set verbatim,
    /// so a caller can also subscribe a client down to nothing.
    pub async fn subscribe(&self, client_id: u64, events: Option<Vec<EventType>>) {
        let mut clients = self.clients.write().await;
        let Some(subscription) = clients.get_mut(&client_id) else {
            warn!(client_id, "Subscribe for unknown client");
            return;
        };

        subscription.subscribed_events = match events {
            Some(events) => events.into_iter().collect(),
            None => EventType::ALL.into_iter().collect(),
        };
        debug!(
            client_id,
            count = subscription.subscribed_events.len(),
            "Subscription replaced"
        );
    }

    // == Unsubscribe ==
    /// Clears a client's filter set (`None`), or subtracts the given types.
    pub async fn unsubscribe(&self, client_id: u64, events: Option<Vec<EventType>>) {
        let mut clients = self.clients.write().await;
        let Some(subscription) = clients.get_mut(&client_id) else {
            warn!(client_id, "Unsubscribe for unknown client");
            return;
        };

        match events {
            Some(events) => {
                for event_type in events {
                    subscription.subscribed_events.remove(&event_type);
                }
            }
            None => subscription.subscribed_events.clear(),
        }
        debug!(
            client_id,
            count = subscription.subscribed_events.len(),
            "Subscription reduced"
        );
    }

    // == Remove Client ==
    /// Drops a client entirely, typically when its session ends.
    pub async fn remove_client(&self, client_id: u64) {
        let mut clients = self.clients.write().await;
        if clients.remove(&client_id).is_some() {
            debug!(client_id, "Client deregistered");
        }
    }

    // == Dispatch ==
    /// Hands an event to every client whose filter set contains its type.
    ///
    /// Clients whose delivery queue is closed are pruned; the remaining
    /// deliveries proceed.
    pub async fn dispatch(&self, event: &CacheEvent) {
        let dead: Vec<u64> = {
            let clients = self.clients.read().await;
            clients
                .iter()
                .filter(|(_, sub)| sub.subscribed_events.contains(&event.event_type))
                .filter_map(|(&id, sub)| sub.sender.send(event.clone()).is_err().then_some(id))
                .collect()
        };

        if !dead.is_empty() {
            let mut clients = self.clients.write().await;
            for client_id in dead {
                clients.remove(&client_id);
                warn!(client_id, "Dropped client with closed delivery queue");
            }
        }
    }

    // == Client Count ==
    /// Number of currently registered clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
