use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Bounded in-memory cache with hit/miss accounting
///
/// Used to memoize expensive per-value work (text vectors, location lookups)
/// that repeats heavily across rows of a hiring dataset.
pub struct LruStore<K: Hash + Eq, V: Clone> {
    inner: Mutex<Inner<K, V>>,
}

struct Inner<K: Hash + Eq, V> {
    cache: LruCache<K, V>,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq, V: Clone> LruStore<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Get a value, recording a hit or a miss
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.cache.get(key).cloned() {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.cache.put(key, value);
    }

    /// Return the cached value or compute, store and return it
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.cache.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let lookups = inner.hits + inner.misses;
        CacheStats {
            size: inner.cache.len(),
            capacity: inner.cache.cap().get(),
            hit_count: inner.hits,
            miss_count: inner.misses,
            hit_rate: if lookups > 0 {
                inner.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a free-text value, insensitive to case and surrounding spaces
    pub fn text(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Key for a location string, insensitive to case and spacing around commas
    pub fn location(location: &str) -> String {
        location
            .split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        let cache: LruStore<String, f64> = LruStore::new(10);

        assert!(cache.get(&"a".to_string()).is_none());
        cache.insert("a".to_string(), 1.5);
        assert_eq!(cache.get(&"a".to_string()), Some(1.5));

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_rate, 0.5);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_eviction_respects_capacity() {
        let cache: LruStore<u32, u32> = LruStore::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.insert(3, 3);

        assert_eq!(cache.stats().size, 2);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&3), Some(3));
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let cache: LruStore<String, usize> = LruStore::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with("k".to_string(), || {
                calls += 1;
                7
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache: LruStore<u8, u8> = LruStore::new(0);
        assert_eq!(cache.stats().capacity, 1);
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::text("  Data Science "), "data science");
        assert_eq!(
            CacheKey::location("Bologna ,BO,  Emilia-Romagna,"),
            "bologna, bo, emilia-romagna"
        );
    }
}
