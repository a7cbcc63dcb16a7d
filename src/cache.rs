use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

/// Entry stored in the map with the instant it was written.
#[derive(Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Volatile in-process response cache with a fixed per-entry TTL.
///
/// Expiry is lazy: entries are checked on read and evicted then. A background
/// sweep can be triggered with `evict_expired()`. Concurrent `set` calls for
/// the same key are last-write-wins; a brief duplicate upstream fetch under
/// contention is tolerated, never a correctness problem.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the stored value only if present and not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            // expired — drop the ref before removing
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Store a value, overwriting any prior entry and resetting its TTL clock.
    pub fn set(&self, key: &str, value: Value) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove every entry immediately.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove all expired entries. Call periodically to bound memory usage.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - self.entries.len()
    }

    /// Current number of entries, expired or not (for the status endpoint).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
