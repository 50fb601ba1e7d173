//! # TTL cache
//!
//! Shared lookup cache for the enrichment stages.
//!
//! A stored `None` is a real result meaning "looked up, nothing found"
//! (negative entry), distinct from an absent or expired key. Entries are
//! refreshed by overwrite once expired; on top of that the cache holds at
//! most `max_entries` keys and evicts the oldest-inserted key first, so a
//! long-running process cannot grow without bound.
//!
//! Callers pass the current `Instant` in, which keeps every method
//! deterministic under test.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: Option<V>,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    insertion_order: VecDeque<String>,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        TtlCache {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Outer `None` means the key was never stored or has expired; `Some(None)`
    /// is a live negative entry.
    pub fn get(&self, key: &str, now: Instant) -> Option<Option<V>> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: &str, value: Option<V>, ttl: Duration, now: Instant) {
        if !self.entries.contains_key(key) {
            while self.entries.len() >= self.max_entries {
                match self.insertion_order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            self.insertion_order.push_back(key.to_string());
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
