//! Frequency Index Module
//!
//! Implements the frequency-bucket bookkeeping for LFU eviction.
//!
//! Keys are grouped into buckets by access count. Each bucket preserves
//! insertion order, so the eviction victim - the longest-resident key among
//! the least-frequently-used - is always the first element of the lowest
//! bucket.

use std::collections::HashMap;

use indexmap::IndexSet;

// == Frequency Index ==
/// Maps each access count to the insertion-ordered set of keys holding it.
#[derive(Debug, Default)]
pub struct FrequencyIndex {
    /// frequency -> keys at that frequency, oldest first
    buckets: HashMap<u64, IndexSet<String>>,
}

impl FrequencyIndex {
    // == Constructor ==
    /// Creates a new empty frequency index.
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    // == Insert ==
    /// Appends a key at the end of the given frequency bucket.
    pub fn insert(&mut self, frequency: u64, key: &str) {
        self.buckets
            .entry(frequency)
            .or_default()
            .insert(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the given frequency bucket.
    ///
    /// Preserves the residual order of the bucket and drops the bucket
    /// entirely once it is empty. Returns false if the key was not there.
    pub fn remove(&mut self, frequency: u64, key: &str) -> bool {
        let Some(bucket) = self.buckets.get_mut(&frequency) else {
            return false;
        };

        let removed = bucket.shift_remove(key);
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
        }
        removed
    }

    // == Front ==
    /// Returns the oldest key in the given frequency bucket, if any.
    pub fn front(&self, frequency: u64) -> Option<&str> {
        self.buckets
            .get(&frequency)
            .and_then(|bucket| bucket.first())
            .map(|key| key.as_str())
    }

    // == Min Frequency ==
    /// Returns the smallest frequency that currently has at least one key.
    pub fn min_frequency(&self) -> Option<u64> {
        self.buckets.keys().min().copied()
    }

    // == Contains Bucket ==
    /// Checks whether a bucket exists for the given frequency.
    pub fn has_bucket(&self, frequency: u64) -> bool {
        self.buckets.contains_key(&frequency)
    }

    // == Length ==
    /// Returns the total number of keys across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    // == Contains ==
    /// Checks whether a key is present in the given bucket.
    #[allow(dead_code)]
    pub fn contains(&self, frequency: u64, key: &str) -> bool {
        self.buckets
            .get(&frequency)
            .map(|bucket| bucket.contains(key))
            .unwrap_or(false)
    }
}
