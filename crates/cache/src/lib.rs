//! Multi-namespace result cache
//!
//! One bounded LRU per stage output kind. Namespaces are disjoint: each has
//! its own capacity, ordering, and counters. Every operation is infallible;
//! callers treat the cache as a transparent fast path and never see an
//! error from it.

pub mod keys;
pub mod lru;

use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};
use speech_bridge_core::types::{AsrResult, AudioBlob};

pub use keys::{asr_key, content_hash, translation_key, tts_key};
pub use lru::{CacheStats, LruCache};

/// Cache namespace selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Translation,
    Asr,
    Tts,
}

/// Point-in-time counters for one namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Snapshot across all namespaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub translation: NamespaceStats,
    pub asr: NamespaceStats,
    pub tts: NamespaceStats,
    /// Hit ratio over all namespaces combined
    pub hit_ratio: f64,
}

/// Stage result cache with one LRU namespace per output kind
pub struct ResultCache {
    translation: LruCache<String>,
    asr: LruCache<AsrResult>,
    tts: LruCache<AudioBlob>,
}

impl ResultCache {
    pub fn new(translation_capacity: usize, asr_capacity: usize, tts_capacity: usize) -> Self {
        Self {
            translation: LruCache::new(translation_capacity),
            asr: LruCache::new(asr_capacity),
            tts: LruCache::new(tts_capacity),
        }
    }

    pub fn get_translation(&self, key: &str) -> Option<String> {
        self.translation.get(key)
    }

    pub fn put_translation(&self, key: &str, value: String) {
        self.translation.put(key, value);
    }

    pub fn get_asr(&self, key: &str) -> Option<AsrResult> {
        self.asr.get(key)
    }

    pub fn put_asr(&self, key: &str, value: AsrResult) {
        self.asr.put(key, value);
    }

    pub fn get_tts(&self, key: &str) -> Option<AudioBlob> {
        self.tts.get(key)
    }

    pub fn put_tts(&self, key: &str, value: AudioBlob) {
        self.tts.put(key, value);
    }

    fn namespace_stats<V: Clone>(cache: &LruCache<V>) -> NamespaceStats {
        NamespaceStats {
            size: cache.len(),
            capacity: cache.capacity(),
            hits: cache.stats.hits.load(Ordering::Relaxed),
            misses: cache.stats.misses.load(Ordering::Relaxed),
            evictions: cache.stats.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let translation = Self::namespace_stats(&self.translation);
        let asr = Self::namespace_stats(&self.asr);
        let tts = Self::namespace_stats(&self.tts);

        let hits = translation.hits + asr.hits + tts.hits;
        let total = hits + translation.misses + asr.misses + tts.misses;
        let hit_ratio = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        CacheSnapshot {
            translation,
            asr,
            tts,
            hit_ratio,
        }
    }

    /// Clear one namespace, or all of them
    pub fn clear(&self, namespace: Option<Namespace>) {
        match namespace {
            Some(Namespace::Translation) => self.translation.clear(),
            Some(Namespace::Asr) => self.asr.clear(),
            Some(Namespace::Tts) => self.tts.clear(),
            None => {
                self.translation.clear();
                self.asr.clear();
                self.tts.clear();
            }
        }
    }
}
