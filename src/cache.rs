//! Bounded TTL + LRU cache for computed responses.
//!
//! Read path lazily evicts stale entries and refreshes hit entries to the
//! most-recently-used position; the write path evicts the least-recently-used
//! entry once capacity is exceeded. State is process-local and advisory:
//! a cold cache is always correct, just slower.

use crate::util::Clock;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry<V> {
    stamped_at: Instant,
    value: V,
}

pub struct TtlCache<V> {
    inner: Mutex<IndexMap<String, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(IndexMap::new()),
            ttl,
            capacity,
            clock,
        }
    }

    /// Fetch a fresh entry, refreshing its recency. Stale entries are
    /// deleted on sight and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut map = self.lock();
        let stale = {
            let entry = map.get(key)?;
            now.duration_since(entry.stamped_at) >= self.ttl
        };
        if stale {
            map.shift_remove(key);
            return None;
        }
        // Delete + reinsert moves the entry to the back, which is the
        // most-recently-used position in insertion order.
        let entry = map.shift_remove(key)?;
        let value = entry.value.clone();
        map.insert(key.to_owned(), entry);
        Some(value)
    }

    /// Insert or refresh an entry, evicting the least-recently-used one
    /// when over capacity.
    pub fn insert(&self, key: String, value: V) {
        let now = self.clock.now();
        let mut map = self.lock();
        map.shift_remove(&key);
        map.insert(
            key,
            Entry {
                stamped_at: now,
                value,
            },
        );
        while map.len() > self.capacity {
            map.shift_remove_index(0);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, Entry<V>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still structurally sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_clock::ManualClock;

    fn cache_with_clock(ttl_secs: u64, capacity: usize) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn entry_served_until_ttl_then_absent() {
        let (cache, clock) = cache_with_clock(120, 10);
        cache.insert("k".into(), "v".into());

        clock.advance(Duration::from_secs(119));
        assert_eq!(cache.get("k"), Some("v".to_string()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k"), None);
        // Lazy eviction removed it entirely.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let (cache, _clock) = cache_with_clock(3600, 3);
        cache.insert("a".into(), "1".into());
        cache.insert("b".into(), "2".into());
        cache.insert("c".into(), "3".into());

        // Touch "a" so "b" becomes the LRU entry.
        assert!(cache.get("a").is_some());
        cache.insert("d".into(), "4".into());

        assert_eq!(cache.len(), 3);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(100, 10);
        cache.insert("k".into(), "old".into());
        clock.advance(Duration::from_secs(90));
        cache.insert("k".into(), "new".into());
        clock.advance(Duration::from_secs(90));
        assert_eq!(cache.get("k"), Some("new".to_string()));
    }
}
