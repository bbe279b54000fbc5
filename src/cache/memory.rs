//! Tier 1: an in-memory LRU keyed by content hash, values shared via `Arc`.
//!
//! Bounded by both entry count and a byte budget computed from caller-
//! supplied size hints — evicting on whichever limit is hit first, so one
//! oversized file can't alone push out the rest of a workspace's trees.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct Entry<V> {
    value: Arc<V>,
    size: usize,
}

pub struct MemoryCache<V> {
    inner: Mutex<LruCache<String, Entry<V>>>,
    max_bytes: usize,
    current_bytes: Mutex<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> MemoryCache<V> {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries.max(1)).unwrap();
        MemoryCache {
            inner: Mutex::new(LruCache::new(cap)),
            max_bytes,
            current_bytes: Mutex::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match guard.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: String, value: Arc<V>, size: usize) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut bytes = self.current_bytes.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(old) = guard.put(key, Entry { value, size }) {
            *bytes = bytes.saturating_sub(old.size);
        }
        *bytes += size;

        while *bytes > self.max_bytes {
            match guard.pop_lru() {
                Some((_, evicted)) => *bytes = bytes.saturating_sub(evicted.size),
                None => break,
            }
        }
    }

    /// §4.8's `remove`: evict `key` if present, adjusting the byte budget.
    pub fn remove(&self, key: &str) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(entry) = guard.pop(key) {
            let mut bytes = self.current_bytes.lock().unwrap_or_else(|p| p.into_inner());
            *bytes = bytes.saturating_sub(entry.size);
        }
    }

    /// §4.8's `exists`: whether `key` is currently resident, without
    /// promoting it in the LRU order the way `get` would.
    pub fn exists(&self, key: &str) -> bool {
        let guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        guard.contains(key)
    }

    /// §4.8's `clear`: drop every entry and reset the byte budget.
    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        guard.clear();
        let mut bytes = self.current_bytes.lock().unwrap_or_else(|p| p.into_inner());
        *bytes = 0;
    }

    /// `(hits, misses, entry_count, approx_bytes)`.
    pub fn stats(&self) -> (u64, u64, usize, usize) {
        let guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let bytes = *self.current_bytes.lock().unwrap_or_else(|p| p.into_inner());
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            guard.len(),
            bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses_are_counted() {
        let cache = MemoryCache::new(8, 1024);
        cache.insert("a".into(), Arc::new(1u32), 10);
        assert_eq!(cache.get("a"), Some(Arc::new(1u32)));
        assert_eq!(cache.get("missing"), None);
        let (hits, misses, entries, _) = cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
        assert_eq!(entries, 1);
    }

    #[test]
    fn byte_budget_evicts_the_least_recently_used_entry() {
        let cache = MemoryCache::new(10, 15);
        cache.insert("a".into(), Arc::new(1u32), 10);
        cache.insert("b".into(), Arc::new(2u32), 10);
        assert_eq!(cache.get("a"), None, "a should have been evicted");
        assert_eq!(cache.get("b"), Some(Arc::new(2u32)));
    }

    #[test]
    fn entry_count_budget_is_also_enforced() {
        let cache = MemoryCache::new(1, 1024);
        cache.insert("a".into(), Arc::new(1u32), 1);
        cache.insert("b".into(), Arc::new(2u32), 1);
        let (_, _, entries, _) = cache.stats();
        assert_eq!(entries, 1);
    }

    #[test]
    fn exists_does_not_require_a_hit_to_be_recorded() {
        let cache: MemoryCache<u32> = MemoryCache::new(8, 1024);
        assert!(!cache.exists("a"));
        cache.insert("a".into(), Arc::new(1u32), 10);
        assert!(cache.exists("a"));
    }

    #[test]
    fn remove_evicts_the_entry_and_frees_its_bytes() {
        let cache = MemoryCache::new(8, 1024);
        cache.insert("a".into(), Arc::new(1u32), 10);
        cache.remove("a");
        assert!(!cache.exists("a"));
        let (_, _, _, bytes) = cache.stats();
        assert_eq!(bytes, 0);
    }

    #[test]
    fn clear_empties_the_cache_and_resets_the_byte_budget() {
        let cache = MemoryCache::new(8, 1024);
        cache.insert("a".into(), Arc::new(1u32), 10);
        cache.insert("b".into(), Arc::new(2u32), 10);
        cache.clear();
        let (_, _, entries, bytes) = cache.stats();
        assert_eq!(entries, 0);
        assert_eq!(bytes, 0);
    }
}
