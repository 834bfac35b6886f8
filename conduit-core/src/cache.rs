//! Cache contract consumed by the container and the manifest reader.
//!
//! Backends live outside this crate; `conduit-std` ships an in-memory one.

use std::time::Duration;

/// Expiration of a cache entry. A zero TTL means "never expires", same as
/// passing no TTL at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Whole seconds.
    Seconds(u64),
    /// An explicit duration.
    Duration(Duration),
}

impl Ttl {
    /// The effective lifetime, or `None` for unlimited.
    pub fn as_duration(&self) -> Option<Duration> {
        let duration = match *self {
            Ttl::Seconds(secs) => Duration::from_secs(secs),
            Ttl::Duration(duration) => duration,
        };
        (!duration.is_zero()).then_some(duration)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Duration(duration)
    }
}

impl From<u64> for Ttl {
    fn from(secs: u64) -> Self {
        Ttl::Seconds(secs)
    }
}

/// Key/value store with optional expiration.
///
/// Write operations report success as `bool`; a backend that cannot store a
/// value returns `false` rather than failing the caller.
pub trait Cache<V: Clone + Send + Sync>: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Option<V>;

    /// Store an entry.
    fn set(&self, key: &str, value: V, ttl: Option<Ttl>) -> bool;

    /// Whether a live entry exists.
    fn has(&self, key: &str) -> bool;

    /// Remove an entry.
    fn delete(&self, key: &str) -> bool;

    /// Remove every entry.
    fn clear(&self) -> bool;

    /// Fetch a live entry, or `default`.
    fn get_or(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Fetch several entries, keeping key order.
    fn get_multiple(&self, keys: &[&str]) -> Vec<(String, Option<V>)> {
        keys.iter()
            .map(|key| ((*key).to_owned(), self.get(key)))
            .collect()
    }

    /// Store several entries with one TTL.
    fn set_multiple(&self, values: Vec<(String, V)>, ttl: Option<Ttl>) -> bool {
        values
            .into_iter()
            .fold(true, |ok, (key, value)| self.set(&key, value, ttl) && ok)
    }

    /// Remove several entries.
    fn delete_multiple(&self, keys: &[&str]) -> bool {
        keys.iter().fold(true, |ok, key| self.delete(key) && ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_is_unlimited() {
        assert_eq!(Ttl::Seconds(0).as_duration(), None);
        assert_eq!(Ttl::Duration(Duration::ZERO).as_duration(), None);
        assert_eq!(Ttl::from(5_u64).as_duration(), Some(Duration::from_secs(5)));
    }
}
