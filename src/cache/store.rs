//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with frequency-bucket LFU
//! eviction and TTL expiration. Every committed mutation is reported to the
//! injected event sink while the caller still holds the engine guard.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::cache::{CacheEntry, CacheStats, FrequencyIndex};
use crate::error::{CacheError, Result};
use crate::events::{CacheEvent, EventSink};

// == Cache Store ==
/// Bounded key-value store with approximate-LFU eviction and TTL support.
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access-count buckets used to select eviction victims
    frequencies: FrequencyIndex,
    /// Smallest frequency that currently has at least one key (0 when empty)
    min_frequency: u64,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Performance statistics
    stats: CacheStats,
    /// Receives one event per committed mutation
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("min_frequency", &self.min_frequency)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity and event sink.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize, sink: Arc<dyn EventSink>) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            entries: HashMap::new(),
            frequencies: FrequencyIndex::new(),
            min_frequency: 0,
            capacity,
            stats: CacheStats::new(),
            sink,
        })
    }

    // == Create ==
    /// Inserts a new key-value pair with optional TTL.
    ///
    /// Returns false on a blank key, a non-positive TTL, or a duplicate key;
    /// no state changes in those cases. When the cache is at capacity, the
    /// longest-resident key of the lowest frequency bucket is evicted first.
    pub fn create(&mut self, key: &str, value: Value, ttl_seconds: Option<i64>) -> bool {
        if is_blank(key) {
            return false;
        }
        let Some(ttl) = normalize_ttl(ttl_seconds) else {
            return false;
        };

        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                // The slot reads as absent; reap it the same way a read would
                self.expire_entry(key);
            }
            Some(_) => return false,
            None => {}
        }

        if self.entries.len() >= self.capacity {
            self.evict_lfu();
        }

        let entry = CacheEntry::new(value.clone(), ttl);
        self.entries.insert(key.to_string(), entry);
        self.frequencies.insert(1, key);
        // A fresh insert always lands at frequency 1
        self.min_frequency = 1;

        self.stats.set_total_entries(self.entries.len());
        self.sink.publish(CacheEvent::added(key, value));
        true
    }

    // == Read ==
    /// Retrieves a value by key, bumping its access count on a hit.
    ///
    /// Returns None on a blank, missing, or expired key. An expired entry is
    /// removed on discovery.
    pub fn read(&mut self, key: &str) -> Option<Value> {
        if is_blank(key) {
            return None;
        }

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.expire_entry(key);
            self.stats.record_miss();
            return None;
        }

        let (value, old_frequency) = match self.entries.get_mut(key) {
            Some(entry) => {
                let old = entry.frequency;
                entry.frequency += 1;
                entry.touch();
                (entry.value.clone(), old)
            }
            None => return None,
        };

        // Move the key up one bucket, appended at the end of the new one
        self.frequencies.remove(old_frequency, key);
        self.frequencies.insert(old_frequency + 1, key);
        if old_frequency == self.min_frequency && !self.frequencies.has_bucket(old_frequency) {
            // Buckets only grow by +1, so the new minimum needs no search
            self.min_frequency = old_frequency + 1;
        }

        self.stats.record_hit();
        Some(value)
    }

    // == Update ==
    /// Replaces the value of an existing, non-expired key.
    ///
    /// Refreshes the access timestamp but never the frequency. The
    /// expiration deadline changes only when a TTL is supplied. An expired
    /// entry is removed on discovery and the update fails.
    pub fn update(&mut self, key: &str, value: Value, ttl_seconds: Option<i64>) -> bool {
        if is_blank(key) {
            return false;
        }
        let Some(ttl) = normalize_ttl(ttl_seconds) else {
            return false;
        };

        match self.entries.get(key) {
            None => return false,
            Some(entry) if entry.is_expired() => {
                self.expire_entry(key);
                return false;
            }
            Some(_) => {}
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value.clone();
            entry.touch();
            if let Some(ttl) = ttl {
                entry.set_ttl(ttl);
            }
        }

        self.sink.publish(CacheEvent::updated(key, value));
        true
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns false on a blank or missing key.
    pub fn delete(&mut self, key: &str) -> bool {
        if is_blank(key) {
            return false;
        }

        match self.entries.remove(key) {
            Some(entry) => {
                self.detach_from_index(key, entry.frequency);
                self.stats.set_total_entries(self.entries.len());
                self.sink.publish(CacheEvent::removed(key, entry.value));
                true
            }
            None => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Emits one `ItemExpired` event per removal and returns the number of
    /// entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.expire_entry(&key);
        }
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Capacity ==
    /// Returns the fixed capacity of the cache.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Eviction ==
    /// Evicts one victim: the first key of the lowest frequency bucket.
    ///
    /// A key found in the index but missing from the primary map is a stale
    /// reference; it is dropped with a warning and selection retries.
    fn evict_lfu(&mut self) {
        loop {
            let bucket = self.min_frequency;
            let Some(victim) = self.frequencies.front(bucket).map(str::to_string) else {
                match self.frequencies.min_frequency() {
                    Some(actual) => {
                        warn!(
                            stale = bucket,
                            actual, "min_frequency out of sync with index; realigning"
                        );
                        self.min_frequency = actual;
                        continue;
                    }
                    None => return,
                }
            };

            match self.entries.remove(&victim) {
                Some(entry) => {
                    self.detach_from_index(&victim, bucket);
                    self.stats.record_eviction();
                    self.stats.set_total_entries(self.entries.len());
                    self.sink
                        .publish(CacheEvent::evicted(&victim, entry.value, entry.frequency));
                    return;
                }
                None => {
                    warn!(
                        key = %victim,
                        "Key present in frequency index but not in primary map; healing"
                    );
                    self.detach_from_index(&victim, bucket);
                }
            }
        }
    }

    /// Removes an expired entry from both structures and reports it.
    fn expire_entry(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.detach_from_index(key, entry.frequency);
            self.stats.record_expiration();
            self.stats.set_total_entries(self.entries.len());
            self.sink.publish(CacheEvent::expired(key, entry.value));
        }
    }

    /// Drops a key from its frequency bucket and keeps `min_frequency` honest.
    fn detach_from_index(&mut self, key: &str, frequency: u64) {
        if !self.frequencies.remove(frequency, key) {
            warn!(
                key,
                frequency, "Key missing from its frequency bucket; index already healed"
            );
        }
        if self.min_frequency == frequency && !self.frequencies.has_bucket(frequency) {
            self.min_frequency = self.frequencies.min_frequency().unwrap_or(0);
        }
    }

    // == Test Support ==
    /// Asserts the structural invariants between the primary map, the
    /// frequency index, and `min_frequency`.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(
            self.entries.len() <= self.capacity,
            "capacity exceeded: {} > {}",
            self.entries.len(),
            self.capacity
        );
        assert_eq!(
            self.entries.len(),
            self.frequencies.len(),
            "primary map and frequency index disagree on size"
        );
        for (key, entry) in &self.entries {
            assert!(
                self.frequencies.contains(entry.frequency, key),
                "key {:?} missing from bucket {}",
                key,
                entry.frequency
            );
        }
        assert_eq!(
            self.min_frequency,
            self.frequencies.min_frequency().unwrap_or(0),
            "min_frequency out of sync"
        );
    }
}

// == Input Validation ==
/// A key is blank when it is empty or whitespace-only.
fn is_blank(key: &str) -> bool {
    key.trim().is_empty()
}

/// Validates an optional TTL: positive values pass through, non-positive
/// values are rejected (None result).
fn normalize_ttl(ttl_seconds: Option<i64>) -> Option<Option<u64>> {
    match ttl_seconds {
        None => Some(None),
        Some(ttl) if ttl > 0 => Some(Some(ttl as u64)),
        Some(_) => None,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use serde_json::json;
    use std::sync::Mutex;
    use std::thread::sleep;
    use std::time::Duration;

    /// Sink that records every event for assertions.
    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<CacheEvent>>,
    }

    impl CollectingSink {
        fn types(&self) -> Vec<EventType> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_type)
                .collect()
        }

        fn last(&self) -> Option<CacheEvent> {
            self.events.lock().unwrap().last().cloned()
        }
    }

    impl EventSink for CollectingSink {
        fn publish(&self, event: CacheEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn store_with_sink(capacity: usize) -> (CacheStore, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::default());
        let store = CacheStore::new(capacity, sink.clone()).unwrap();
        (store, sink)
    }

    #[test]
    fn test_store_new() {
        let (store, _) = store_with_sink(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_store_zero_capacity_rejected() {
        let sink = Arc::new(CollectingSink::default());
        let result = CacheStore::new(0, sink);
        assert!(matches!(result, Err(CacheError::InvalidCapacity(0))));
    }

    #[test]
    fn test_create_and_read() {
        let (mut store, sink) = store_with_sink(100);

        assert!(store.create("key1", json!("value1"), None));
        assert_eq!(store.read("key1"), Some(json!("value1")));
        assert_eq!(store.len(), 1);
        assert_eq!(sink.types(), vec![EventType::ItemAdded]);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let (mut store, sink) = store_with_sink(100);

        assert!(store.create("key1", json!(1), None));
        assert!(!store.create("key1", json!(2), None));

        // The original value survives
        assert_eq!(store.read("key1"), Some(json!(1)));
        assert_eq!(sink.types(), vec![EventType::ItemAdded]);
    }

    #[test]
    fn test_blank_key_rejected_everywhere() {
        let (mut store, sink) = store_with_sink(100);

        assert!(!store.create("", json!(1), None));
        assert!(!store.create("   ", json!(1), None));
        assert_eq!(store.read(""), None);
        assert!(!store.update("  ", json!(1), None));
        assert!(!store.delete(""));

        assert!(store.is_empty());
        assert!(sink.types().is_empty());
        // Blank keys never touch the statistics either
        assert_eq!(store.stats().misses, 0);
    }

    #[test]
    fn test_read_missing_key() {
        let (mut store, _) = store_with_sink(100);
        assert_eq!(store.read("nope"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_read_bumps_frequency() {
        let (mut store, _) = store_with_sink(100);

        store.create("k", json!(1), None);
        store.read("k");
        store.read("k");

        store.check_invariants();
        assert_eq!(store.stats().hits, 2);
    }

    #[test]
    fn test_update_replaces_value() {
        let (mut store, sink) = store_with_sink(100);

        store.create("k", json!(1), None);
        assert!(store.update("k", json!(2), None));
        assert_eq!(store.read("k"), Some(json!(2)));
        assert_eq!(
            sink.types(),
            vec![EventType::ItemAdded, EventType::ItemUpdated]
        );
    }

    #[test]
    fn test_update_missing_key_fails() {
        let (mut store, sink) = store_with_sink(100);
        assert!(!store.update("ghost", json!(1), None));
        assert!(sink.types().is_empty());
    }

    #[test]
    fn test_update_without_ttl_preserves_deadline() {
        let (mut store, _) = store_with_sink(100);

        store.create("k", json!(1), Some(3600));
        let before = store.entries.get("k").unwrap().expires_at;

        assert!(store.update("k", json!(2), None));
        let after = store.entries.get("k").unwrap().expires_at;

        assert_eq!(before, after);
    }

    #[test]
    fn test_update_with_ttl_replaces_deadline() {
        let (mut store, _) = store_with_sink(100);

        store.create("k", json!(1), None);
        assert!(store.entries.get("k").unwrap().expires_at.is_none());

        assert!(store.update("k", json!(2), Some(60)));
        assert!(store.entries.get("k").unwrap().expires_at.is_some());
    }

    #[test]
    fn test_update_never_changes_frequency() {
        let (mut store, _) = store_with_sink(100);

        store.create("k", json!(1), None);
        store.read("k");
        let before = store.entries.get("k").unwrap().frequency;

        store.update("k", json!(2), None);
        assert_eq!(store.entries.get("k").unwrap().frequency, before);
        store.check_invariants();
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let (mut store, sink) = store_with_sink(100);

        assert!(!store.create("k", json!(1), Some(0)));
        assert!(!store.create("k", json!(1), Some(-5)));
        assert!(store.is_empty());

        store.create("k", json!(1), None);
        assert!(!store.update("k", json!(2), Some(0)));
        assert_eq!(store.read("k"), Some(json!(1)));
        assert_eq!(sink.types(), vec![EventType::ItemAdded]);
    }

    #[test]
    fn test_delete() {
        let (mut store, sink) = store_with_sink(100);

        store.create("k", json!(1), None);
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(store.is_empty());
        assert_eq!(
            sink.types(),
            vec![EventType::ItemAdded, EventType::ItemRemoved]
        );
        store.check_invariants();
    }

    #[test]
    fn test_lfu_eviction_prefers_least_frequent() {
        let (mut store, sink) = store_with_sink(2);

        store.create("a", json!(1), None);
        store.create("b", json!(2), None);
        store.read("a"); // a: freq 2, b: freq 1

        store.create("c", json!(3), None);

        assert_eq!(store.read("b"), None);
        assert_eq!(store.read("a"), Some(json!(1)));
        assert_eq!(store.read("c"), Some(json!(3)));

        let evicted = sink
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.event_type == EventType::ItemEvicted)
            .cloned()
            .unwrap();
        assert_eq!(evicted.key, "b");
        assert_eq!(
            evicted.reason.as_deref(),
            Some("LFU eviction (frequency: 1)")
        );
        store.check_invariants();
    }

    #[test]
    fn test_lfu_eviction_ties_break_by_residence() {
        let (mut store, sink) = store_with_sink(2);

        store.create("old", json!(1), None);
        store.create("new", json!(2), None);
        // Both at frequency 1: the longest-resident goes first
        store.create("third", json!(3), None);

        assert_eq!(store.read("old"), None);
        assert_eq!(store.read("new"), Some(json!(2)));

        let evicted = sink
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.event_type == EventType::ItemEvicted)
            .cloned()
            .unwrap();
        assert_eq!(evicted.key, "old");
    }

    #[test]
    fn test_eviction_emitted_before_add() {
        let (mut store, sink) = store_with_sink(1);

        store.create("a", json!(1), None);
        store.create("b", json!(2), None);

        assert_eq!(
            sink.types(),
            vec![
                EventType::ItemAdded,
                EventType::ItemEvicted,
                EventType::ItemAdded
            ]
        );
        assert_eq!(store.len(), 1);
        store.check_invariants();
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let (mut store, _) = store_with_sink(3);

        for i in 0..20 {
            store.create(&format!("key{}", i), json!(i), None);
            assert!(store.len() <= 3);
        }
        store.check_invariants();
        assert_eq!(store.stats().evictions, 17);
    }

    #[test]
    fn test_ttl_expiration_on_read() {
        let (mut store, sink) = store_with_sink(100);

        store.create("k", json!("v"), Some(1));
        assert_eq!(store.read("k"), Some(json!("v")));

        sleep(Duration::from_millis(1100));

        assert_eq!(store.read("k"), None);
        assert!(store.is_empty());
        assert_eq!(sink.last().unwrap().event_type, EventType::ItemExpired);
        assert_eq!(store.stats().expirations, 1);
        store.check_invariants();
    }

    #[test]
    fn test_expired_entry_blocks_update() {
        let (mut store, sink) = store_with_sink(100);

        store.create("k", json!(1), Some(1));
        sleep(Duration::from_millis(1100));

        assert!(!store.update("k", json!(2), None));
        assert!(store.is_empty());
        assert_eq!(sink.last().unwrap().event_type, EventType::ItemExpired);
    }

    #[test]
    fn test_create_over_expired_key_succeeds() {
        let (mut store, sink) = store_with_sink(100);

        store.create("k", json!(1), Some(1));
        sleep(Duration::from_millis(1100));

        assert!(store.create("k", json!(2), None));
        assert_eq!(store.read("k"), Some(json!(2)));
        assert_eq!(
            sink.types(),
            vec![
                EventType::ItemAdded,
                EventType::ItemExpired,
                EventType::ItemAdded
            ]
        );
        store.check_invariants();
    }

    #[test]
    fn test_cleanup_expired() {
        let (mut store, sink) = store_with_sink(100);

        store.create("short", json!(1), Some(1));
        store.create("long", json!(2), Some(60));
        store.create("forever", json!(3), None);

        sleep(Duration::from_millis(1100));

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.read("long"), Some(json!(2)));
        assert_eq!(store.read("forever"), Some(json!(3)));

        let expired: Vec<_> = sink
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == EventType::ItemExpired)
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(expired, vec!["short"]);
        store.check_invariants();
    }

    #[test]
    fn test_min_frequency_follows_bumps() {
        let (mut store, _) = store_with_sink(100);

        store.create("a", json!(1), None);
        store.read("a"); // only key, bucket 1 vanished
        assert_eq!(store.min_frequency, 2);

        store.create("b", json!(2), None);
        assert_eq!(store.min_frequency, 1);
        store.check_invariants();
    }

    #[test]
    fn test_stats_accuracy() {
        let (mut store, _) = store_with_sink(100);

        store.create("k", json!(1), None);
        store.read("k");
        store.read("ghost");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
