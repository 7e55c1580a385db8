//! LRU cache primitive
//!
//! Hash-bucketed doubly-linked list. All list state lives behind one mutex
//! so lookup promotion and capacity eviction are atomic with respect to
//! concurrent callers. Nodes carry the full key; a bucket whose stored key
//! differs from the probe is a hash collision and reads as a miss, which
//! keeps the cache transparent at the cost of the rare extra model call.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Hit/miss/eviction counters, shared across threads
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

struct LruNode<V> {
    key: String,
    value: V,
    prev: Option<u64>,
    next: Option<u64>,
}

struct LruState<V> {
    entries: HashMap<u64, LruNode<V>>,
    /// Most recently used
    head: Option<u64>,
    /// Least recently used
    tail: Option<u64>,
}

impl<V> LruState<V> {
    fn unlink(&mut self, bucket: u64) {
        let (prev, next) = match self.entries.get(&bucket) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.entries.get_mut(&p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.entries.get_mut(&n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.entries.get_mut(&bucket) {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, bucket: u64) {
        let old_head = self.head;
        if let Some(node) = self.entries.get_mut(&bucket) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.entries.get_mut(&h) {
                node.prev = Some(bucket);
            }
        }
        self.head = Some(bucket);
        if self.tail.is_none() {
            self.tail = Some(bucket);
        }
    }
}

/// Thread-safe bounded LRU cache
pub struct LruCache<V: Clone> {
    capacity: usize,
    state: Mutex<LruState<V>>,
    pub stats: CacheStats,
}

impl<V: Clone> LruCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                head: None,
                tail: None,
            }),
            stats: CacheStats::default(),
        }
    }

    fn bucket_of(key: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Look up a key, promoting it to most recently used on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        let bucket = Self::bucket_of(key);
        let mut state = self.state.lock();

        let value = match state.entries.get(&bucket) {
            Some(node) if node.key == key => node.value.clone(),
            _ => {
                self.stats.record_miss();
                return None;
            }
        };

        state.unlink(bucket);
        state.push_front(bucket);
        self.stats.record_hit();
        Some(value)
    }

    /// Insert a key as most recently used, evicting from the LRU end past
    /// capacity. Overwriting an existing key promotes it.
    pub fn put(&self, key: &str, value: V) {
        let bucket = Self::bucket_of(key);
        let mut state = self.state.lock();

        if state.entries.contains_key(&bucket) {
            // Same bucket: overwrite, including the collision case where a
            // different key takes the slot over.
            if let Some(node) = state.entries.get_mut(&bucket) {
                node.key = key.to_string();
                node.value = value;
            }
            state.unlink(bucket);
            state.push_front(bucket);
            return;
        }

        state.entries.insert(
            bucket,
            LruNode {
                key: key.to_string(),
                value,
                prev: None,
                next: None,
            },
        );
        state.push_front(bucket);

        while state.entries.len() > self.capacity {
            let Some(victim) = state.tail else { break };
            state.unlink(victim);
            state.entries.remove(&victim);
            self.stats.record_eviction();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries and reset counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.head = None;
        state.tail = None;
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_miss_then_hit() {
        let cache: LruCache<String> = LruCache::new(4);
        assert_eq!(cache.get("a"), None);
        cache.put("a", "1".to_string());
        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.stats.hits.load(Ordering::Relaxed), 1);
        assert_eq!(cache.stats.misses.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let cache: LruCache<u32> = LruCache::new(3);
        for i in 0..10 {
            cache.put(&format!("k{}", i), i);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats.evictions.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_eviction_order_is_lru() {
        let cache: LruCache<u32> = LruCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        // touch "a" so "b" becomes least recently used
        assert_eq!(cache.get("a"), Some(1));
        cache.put("d", 4);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.get("d"), Some(4));
    }

    #[test]
    fn test_overwrite_promotes() {
        let cache: LruCache<u32> = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);

        // "b" was least recently used after "a" was rewritten
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_clear_resets_stats() {
        let cache: LruCache<u32> = LruCache::new(2);
        cache.put("a", 1);
        cache.get("a");
        cache.get("zzz");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats.hits.load(Ordering::Relaxed), 0);
        assert_eq!(cache.stats.misses.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_hit_ratio() {
        let cache: LruCache<u32> = LruCache::new(2);
        cache.put("a", 1);
        cache.get("a");
        cache.get("a");
        cache.get("missing");
        let ratio = cache.stats.hit_ratio();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }
}
