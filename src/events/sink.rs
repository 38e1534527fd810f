//! Event Sink Module
//!
//! The seam between the cache engine and the notification fabric.
//!
//! The engine calls [`EventSink::publish`] while its serialization guard is
//! held, so implementations must hand the event off without blocking. The
//! channel-backed sink below pushes onto an unbounded queue that the
//! dispatcher task drains.

use tokio::sync::mpsc;
use tracing::debug;

use super::types::CacheEvent;

// == Event Sink Trait ==
/// Receives every event the engine emits.
///
/// Must not perform blocking I/O: the engine's guard is held at call time.
pub trait EventSink: Send + Sync {
    /// Hands off one committed event.
    fn publish(&self, event: CacheEvent);
}

// == Channel Sink ==
/// Sink that enqueues events to the dispatcher task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CacheEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end for the dispatcher.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CacheEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: CacheEvent) {
        // The engine's state is already committed; a closed queue only means
        // the dispatcher is gone, which happens during shutdown.
        if self.tx.send(event).is_err() {
            debug!("Event dropped: dispatcher queue closed");
        }
    }
}

// == Null Sink ==
/// Sink that discards every event. Useful where no fan-out is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: CacheEvent) {}
}
