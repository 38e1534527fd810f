//! Server Module
//!
//! TCP surface of the cache: frame codec, per-connection sessions, the
//! accept loop, and the shared state wiring.

pub mod codec;
pub mod listener;
pub mod session;

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::events::{CacheEvent, ChannelSink, SubscriptionRegistry};

pub use listener::serve;

/// Application state shared across all sessions.
#[derive(Clone)]
pub struct AppState {
    /// The cache engine behind its serialization guard
    pub cache: Arc<RwLock<CacheStore>>,
    /// Subscription registry for event fan-out
    pub registry: Arc<SubscriptionRegistry>,
}

impl AppState {
    /// Builds the engine, its event sink, and the registry from configuration.
    ///
    /// Returns the receiving end of the event queue; hand it to
    /// [`crate::events::spawn_dispatcher`] to activate notifications.
    ///
    /// # Errors
    /// Fails when the configured capacity is zero.
    pub fn from_config(config: &Config) -> Result<(Self, mpsc::UnboundedReceiver<CacheEvent>)> {
        let (sink, event_rx) = ChannelSink::new();
        let store = CacheStore::new(config.max_items, Arc::new(sink))?;

        Ok((
            Self {
                cache: Arc::new(RwLock::new(store)),
                registry: Arc::new(SubscriptionRegistry::new()),
            },
            event_rx,
        ))
    }
}
