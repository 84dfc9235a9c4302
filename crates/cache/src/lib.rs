//! The Cache Layer (C10): TTL-bounded, per-key single-writer caches keyed
//! by stable fingerprints, generic over the cached value so the same type
//! backs both the memory-search cache and the LLM-response cache.

use chrono::Duration;
use dashmap::DashMap;
use remind_core::CacheEntry;
use sha2::{Digest, Sha256};

/// A concurrent TTL cache. Readers never block each other; writes to the
/// same key race last-writer-wins, safe for concurrent readers with a
/// single writer per key — `DashMap` shards internally so distinct keys
/// don't contend at all.
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Returns the cached value if present and not expired; expired entries
    /// are purged lazily on this read rather than via a background sweep.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: String, value: V) {
        self.entries.insert(key, CacheEntry::new(value, self.ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// `hash(normalized_topic + ":" + k + ":" + filter_canonical_form)` — the
/// memory-search cache key.
pub fn memory_search_key(normalized_topic: &str, k: usize, filter_canonical_form: &str) -> String {
    fingerprint(&format!("{normalized_topic}:{k}:{filter_canonical_form}"))
}

/// `hash(prompt_canonical)` — the LLM-response cache key.
pub fn llm_key(prompt_canonical: &str) -> String {
    fingerprint(prompt_canonical)
}

fn fingerprint(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    #[test]
    fn put_then_get_round_trips() {
        let cache: TtlCache<String> = TtlCache::new(30);
        cache.put("k".into(), "v".into());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn expired_entries_are_purged_on_read() {
        let cache: TtlCache<i32> = TtlCache {
            entries: DashMap::new(),
            ttl: Duration::milliseconds(1),
        };
        cache.put("k".into(), 1);
        sleep(StdDuration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_search_key_is_stable_for_equal_inputs() {
        let a = memory_search_key("disney trip", 5, "none");
        let b = memory_search_key("disney trip", 5, "none");
        let c = memory_search_key("disney trip", 6, "none");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
