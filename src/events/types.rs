//! Cache Event Types
//!
//! Defines the typed events raised by the cache engine on every visible
//! state change, in the shape they travel over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Event Type ==
/// Discriminates the kind of state change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A new entry was inserted
    ItemAdded,
    /// An existing entry's value was replaced
    ItemUpdated,
    /// An entry was removed by an explicit delete
    ItemRemoved,
    /// An entry was removed because its TTL elapsed
    ItemExpired,
    /// An entry was removed to make room for a new one
    ItemEvicted,
}

impl EventType {
    /// Every event type, for "subscribe to everything" semantics.
    pub const ALL: [EventType; 5] = [
        EventType::ItemAdded,
        EventType::ItemUpdated,
        EventType::ItemRemoved,
        EventType::ItemExpired,
        EventType::ItemEvicted,
    ];

    /// Parses an event type from its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ItemAdded" => Some(EventType::ItemAdded),
            "ItemUpdated" => Some(EventType::ItemUpdated),
            "ItemRemoved" => Some(EventType::ItemRemoved),
            "ItemExpired" => Some(EventType::ItemExpired),
            "ItemEvicted" => Some(EventType::ItemEvicted),
            _ => None,
        }
    }

    /// Wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ItemAdded => "ItemAdded",
            EventType::ItemUpdated => "ItemUpdated",
            EventType::ItemRemoved => "ItemRemoved",
            EventType::ItemExpired => "ItemExpired",
            EventType::ItemEvicted => "ItemEvicted",
        }
    }
}

// == Cache Event ==
/// A single engine-visible state change.
///
/// Emitted exactly once per committed mutation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CacheEvent {
    /// The kind of change
    pub event_type: EventType,
    /// The key the change applies to
    pub key: String,
    /// The entry value at the time of the change, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// When the engine committed the change (UTC)
    pub timestamp: DateTime<Utc>,
    /// Human-readable detail, currently only set for evictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CacheEvent {
    fn new(event_type: EventType, key: &str, value: Option<Value>, reason: Option<String>) -> Self {
        Self {
            event_type,
            key: key.to_string(),
            value,
            timestamp: Utc::now(),
            reason,
        }
    }

    /// Event for a fresh insert.
    pub fn added(key: &str, value: Value) -> Self {
        Self::new(EventType::ItemAdded, key, Some(value), None)
    }

    /// Event for a value replacement.
    pub fn updated(key: &str, value: Value) -> Self {
        Self::new(EventType::ItemUpdated, key, Some(value), None)
    }

    /// Event for an explicit delete.
    pub fn removed(key: &str, value: Value) -> Self {
        Self::new(EventType::ItemRemoved, key, Some(value), None)
    }

    /// Event for a TTL expiration.
    pub fn expired(key: &str, value: Value) -> Self {
        Self::new(EventType::ItemExpired, key, Some(value), None)
    }

    /// Event for an LFU eviction, carrying the victim's frequency.
    pub fn evicted(key: &str, value: Value, frequency: u64) -> Self {
        Self::new(
            EventType::ItemEvicted,
            key,
            Some(value),
            Some(format!("LFU eviction (frequency: {})", frequency)),
        )
    }
}
