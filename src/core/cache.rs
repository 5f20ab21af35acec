//! Size-bounded LRU caches
//!
//! Each [`BoundedCache`] enforces both an entry-count budget and a byte
//! budget. Sizes are estimates: the caller may pass one, otherwise the
//! JSON-serialized length of the value is used.

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Size charged when a value cannot be serialized for estimation
pub const FALLBACK_SIZE_ESTIMATE: usize = 1024;

const MB: usize = 1024 * 1024;

/// Approximate in-memory cost of a value
pub fn estimate_size<V: Serialize + ?Sized>(value: &V) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(FALLBACK_SIZE_ESTIMATE)
}

/// Snapshot of one cache's counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
    pub entries: usize,
    pub bytes: usize,
    pub max_entries: usize,
    pub max_bytes: usize,
}

struct Entry<V> {
    value: V,
    size: usize,
    inserted: Instant,
    access_count: u64,
    last_access: Instant,
}

/// Bookkeeping of one cached entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub size: usize,
    pub age: Duration,
    pub access_count: u64,
    pub idle: Duration,
}

struct Inner<V> {
    entries: LruCache<String, Entry<V>>,
    bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe LRU cache with entry and byte budgets
pub struct BoundedCache<V> {
    name: &'static str,
    max_entries: usize,
    max_bytes: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone + Serialize> BoundedCache<V> {
    pub fn new(name: &'static str, max_bytes: usize, max_entries: usize) -> Self {
        Self {
            name,
            max_entries,
            max_bytes,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Create a cache with a budget given in megabytes
    pub fn with_megabytes(name: &'static str, max_mb: usize, max_entries: usize) -> Self {
        Self::new(name, max_mb.saturating_mul(MB), max_entries)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch a value no older than `max_age`, promoting it to most recently used
    ///
    /// An entry older than `max_age` is removed and counts as a miss.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<V> {
        let mut inner = self.inner.lock();

        match inner.entries.peek(key).map(|entry| entry.inserted.elapsed()) {
            None => {
                inner.misses += 1;
                tracing::debug!("{} cache miss: {}", self.name, key);
                return None;
            }
            Some(age) if age > max_age => {
                if let Some(entry) = inner.entries.pop(key) {
                    inner.bytes -= entry.size;
                }
                inner.misses += 1;
                tracing::debug!("{} cache entry expired: {}", self.name, key);
                return None;
            }
            Some(_) => {}
        }

        inner.hits += 1;
        inner.entries.get_mut(key).map(|entry| {
            entry.access_count += 1;
            entry.last_access = Instant::now();
            entry.value.clone()
        })
    }

    /// Insert or replace a value, evicting least recently used entries to fit
    pub fn put(&self, key: impl Into<String>, value: V, size_estimate: Option<usize>) {
        let key = key.into();
        let size = size_estimate.unwrap_or_else(|| estimate_size(&value));
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.pop(&key) {
            inner.bytes -= old.size;
        }

        while !inner.entries.is_empty()
            && (inner.entries.len() >= self.max_entries || inner.bytes + size > self.max_bytes)
        {
            if let Some((evicted, entry)) = inner.entries.pop_lru() {
                inner.bytes -= entry.size;
                inner.evictions += 1;
                tracing::debug!("{} cache evicted {} ({} bytes)", self.name, evicted, entry.size);
            }
        }

        let now = Instant::now();
        inner.bytes += size;
        inner.entries.put(
            key,
            Entry {
                value,
                size,
                inserted: now,
                access_count: 0,
                last_access: now,
            },
        );
    }

    /// Value for a key without promoting it, checking age or counting a hit
    pub fn peek(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.peek(key).map(|entry| entry.value.clone())
    }

    /// Whether a key is present, without promoting it or checking age
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Size, age and access counters of an entry, without promoting it
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let inner = self.inner.lock();
        inner.entries.peek(key).map(|entry| EntryInfo {
            size: entry.size,
            age: entry.inserted.elapsed(),
            access_count: entry.access_count,
            idle: entry.last_access.elapsed(),
        })
    }

    /// Remove one key; returns the number of entries removed
    pub fn invalidate(&self, key: &str) -> usize {
        let mut inner = self.inner.lock();
        match inner.entries.pop(key) {
            Some(entry) => {
                inner.bytes -= entry.size;
                1
            }
            None => 0,
        }
    }

    /// Remove every key containing `pattern`
    pub fn invalidate_matching(&self, pattern: &str) -> usize {
        let mut inner = self.inner.lock();
        let keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            if let Some(entry) = inner.entries.pop(key) {
                inner.bytes -= entry.size;
            }
        }
        keys.len()
    }

    /// Remove everything; counters are kept
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.bytes = 0;
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate: if total == 0 { 0.0 } else { inner.hits as f64 / total as f64 },
            entries: inner.entries.len(),
            bytes: inner.bytes,
            max_entries: self.max_entries,
            max_bytes: self.max_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_entry_budget_evicts_lru() {
        let cache = BoundedCache::new("test", 1 << 20, 2);
        cache.put("a", 1u32, None);
        cache.put("b", 2u32, None);
        cache.put("c", 3u32, None);

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_peek_leaves_order_and_stats() {
        let cache = BoundedCache::new("test", 1 << 20, 2);
        cache.put("a", 1u32, None);
        cache.put("b", 2u32, None);

        assert_eq!(cache.peek("a"), Some(1));
        assert_eq!(cache.peek("missing"), None);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (0, 0));
        assert_eq!(cache.entry_info("a").map(|info| info.access_count), Some(0));

        cache.put("c", 3u32, None);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_get_promotes() {
        let cache = BoundedCache::new("test", 1 << 20, 2);
        cache.put("a", 1u32, None);
        cache.put("b", 2u32, None);
        assert_eq!(cache.get("a", HOUR), Some(1));
        cache.put("c", 3u32, None);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_max_age_zero_after_delay() {
        let cache = BoundedCache::new("test", 1 << 20, 10);
        cache.put("a", "value".to_string(), None);
        thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.get("a", Duration::ZERO), None);
        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_byte_budget() {
        let cache = BoundedCache::new("test", 100, 100);
        cache.put("a", 0u8, Some(40));
        cache.put("b", 0u8, Some(40));
        cache.put("c", 0u8, Some(40));

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.bytes, 80);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_oversized_entry_empties_cache() {
        let cache = BoundedCache::new("test", 100, 100);
        cache.put("a", 0u8, Some(10));
        cache.put("huge", 0u8, Some(500));

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("huge"));
    }

    #[test]
    fn test_replace_existing_key() {
        let cache = BoundedCache::new("test", 1000, 10);
        cache.put("a", 1u32, Some(100));
        cache.put("a", 2u32, Some(50));

        assert_eq!(cache.get("a", HOUR), Some(2));
        assert_eq!(cache.stats().bytes, 50);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidation_counts() {
        let cache = BoundedCache::new("test", 1 << 20, 10);
        cache.put("deps:app", 1u32, None);
        cache.put("deps:api", 2u32, None);
        cache.put("workspace:app", 3u32, None);

        assert_eq!(cache.invalidate("deps:api"), 1);
        assert_eq!(cache.invalidate("deps:api"), 0);
        assert_eq!(cache.invalidate_matching("app"), 2);
        cache.put("x", 4u32, None);
        cache.put("y", 5u32, None);
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().bytes, 0);
    }

    #[test]
    fn test_size_estimate_from_json() {
        assert_eq!(estimate_size(&"abc"), 5);
        assert_eq!(estimate_size(&vec![1, 2]), 5);
    }

    #[test]
    fn test_hit_rate() {
        let cache = BoundedCache::new("test", 1 << 20, 10);
        cache.put("a", 1u32, None);
        cache.get("a", HOUR);
        cache.get("b", HOUR);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entry_info_tracks_access() {
        let cache = BoundedCache::new("test", 1 << 20, 10);
        cache.put("a", 1u32, Some(8));
        assert_eq!(cache.entry_info("a").map(|info| info.access_count), Some(0));

        cache.get("a", HOUR);
        cache.get("a", HOUR);

        let info = cache.entry_info("a").unwrap();
        assert_eq!(info.access_count, 2);
        assert_eq!(info.size, 8);
        assert!(info.idle <= info.age);
        assert!(cache.entry_info("missing").is_none());
    }
}
