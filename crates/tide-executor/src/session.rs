//! Bounded session store with idle expiry.
//!
//! Replaces process-global maps for per-user state: entries are evicted
//! when idle longer than the TTL, and the least recently used entry is
//! evicted when the store is full.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default maximum number of sessions.
pub const DEFAULT_SESSION_CAPACITY: usize = 1_024;

/// Default idle timeout (30 min).
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Entry<V> {
    value: V,
    last_access: Instant,
}

#[derive(Debug)]
pub struct SessionStore<K, V> {
    capacity: usize,
    idle_ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> SessionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            idle_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Value for `key`, refreshing its idle timer. Expired entries are
    /// removed and reported as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get_mut(key) {
            Some(entry) if entry.last_access.elapsed() < self.idle_ttl => {
                entry.last_access = Instant::now();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Insert or replace, evicting the least recently used entry when full.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!(capacity = self.capacity, "Session store full, evicted oldest entry");
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                last_access: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    /// Drop every idle entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.last_access.elapsed() < self.idle_ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K, V> Default for SessionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_IDLE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_expiry() {
        let store: SessionStore<&str, u32> = SessionStore::new(4, Duration::from_secs(10));
        store.insert("a", 1);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get(&"a"), Some(1));

        // The read above reset the idle timer.
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get(&"a"), Some(1));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get(&"a"), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction() {
        let store: SessionStore<u8, &str> = SessionStore::new(2, Duration::from_secs(60));
        store.insert(1, "one");
        tokio::time::advance(Duration::from_millis(10)).await;
        store.insert(2, "two");
        tokio::time::advance(Duration::from_millis(10)).await;
        // Touch 1 so that 2 becomes the eviction candidate.
        assert!(store.get(&1).is_some());
        tokio::time::advance(Duration::from_millis(10)).await;
        store.insert(3, "three");

        assert_eq!(store.len(), 2);
        assert!(store.get(&2).is_none());
        assert_eq!(store.get(&1), Some("one"));
        assert_eq!(store.get(&3), Some("three"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store: SessionStore<u8, u8> = SessionStore::new(8, Duration::from_secs(5));
        store.insert(1, 1);
        tokio::time::advance(Duration::from_secs(3)).await;
        store.insert(2, 2);
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&2), Some(2));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let store: SessionStore<u8, u8> = SessionStore::new(0, Duration::from_secs(5));
        assert_eq!(store.capacity(), 1);
    }
}
