//! In-memory cache backend.

use conduit_core::{Cache, Ttl};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A process-local cache. Expired entries are dropped lazily on access.
pub struct MemoryCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    default_ttl: Option<Ttl>,
}

impl<V> MemoryCache<V> {
    /// Create an empty cache without a default TTL.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: None,
        }
    }

    /// Apply `ttl` to every `set` that does not pass its own.
    pub fn with_default_ttl(mut self, ttl: Ttl) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Get the number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn expiry(&self, ttl: Option<Ttl>) -> Option<Instant> {
        ttl.or(self.default_ttl)
            .and_then(|ttl| ttl.as_duration())
            .map(|d: Duration| Instant::now() + d)
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // A concurrent `set` may have replaced the entry since the read.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key).filter(|entry| entry.is_live(now)) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    fn set(&self, key: &str, value: V, ttl: Option<Ttl>) -> bool {
        let expires_at = self.expiry(ttl);
        self.entries
            .write()
            .insert(key.to_owned(), Entry { value, expires_at });
        true
    }

    fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key);
        true
    }

    fn clear(&self) -> bool {
        self.entries.write().clear();
        true
    }
}
