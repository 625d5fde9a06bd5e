//! The optional per-action response cache.
//!
//! Read and Search can short-circuit through a cache keyed on the
//! resource type, the effective criteria, and any qualifiers (the
//! primary key, the relation name). The cached unit is the prepared
//! envelope value, so a hit skips both the store and the envelope
//! builder. Entries carry an optional TTL and a dependency list; a
//! successful mutation invalidates every entry depending on the mutated
//! type. Leaving the cache out of the action context disables it.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use praxis_core::{Criteria, Value};

/// A pluggable action-result cache.
pub trait ActionCache: Send + Sync {
    /// Reads a cached envelope value. Expired entries read as misses.
    fn read(&self, key: u64) -> Option<Value>;

    /// Writes an envelope value through to the cache. `ttl` bounds the
    /// entry's lifetime (`None` never expires); `dependencies` are the
    /// tags [`Self::invalidate`] matches against, usually the resource
    /// types the value was built from.
    fn write(&self, key: u64, value: &Value, ttl: Option<Duration>, dependencies: &[String]);

    /// Drops every entry carrying the given dependency tag.
    fn invalidate(&self, dependency: &str);
}

/// Computes the cache key for an action invocation.
#[must_use]
pub fn cache_key(resource_type: &str, criteria: &Criteria, qualifiers: &[&str]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    resource_type.hash(&mut hasher);
    serde_json::to_string(criteria)
        .unwrap_or_default()
        .hash(&mut hasher);
    for qualifier in qualifiers {
        qualifier.hash(&mut hasher);
    }
    hasher.finish()
}

struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
    dependencies: Vec<String>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// A process-local cache with TTL expiry and dependency invalidation,
/// suitable for tests and small deployments.
#[derive(Default)]
pub struct MemoryActionCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl MemoryActionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ActionCache for MemoryActionCache {
    fn read(&self, key: u64) -> Option<Value> {
        let mut entries = self.entries.lock();
        let expired = entries
            .get(&key)
            .map_or(true, |entry| entry.is_expired(Instant::now()));
        if expired {
            entries.remove(&key);
            return None;
        }
        entries.get(&key).map(|entry| entry.value.clone())
    }

    fn write(&self, key: u64, value: &Value, ttl: Option<Duration>, dependencies: &[String]) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value: value.clone(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
                dependencies: dependencies.to_vec(),
            },
        );
    }

    fn invalidate(&self, dependency: &str) {
        self.entries
            .lock()
            .retain(|_, entry| !entry.dependencies.iter().any(|dep| dep == dependency));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_varies_with_criteria() {
        let a = cache_key("widgets", &Criteria::new(), &[]);
        let b = cache_key("widgets", &Criteria::new().with_query("foo"), &[]);
        let c = cache_key("parts", &Criteria::new(), &[]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_key_varies_with_qualifiers() {
        let a = cache_key("widgets", &Criteria::new(), &["42"]);
        let b = cache_key("widgets", &Criteria::new(), &["43"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_write_then_read() {
        let cache = MemoryActionCache::new();
        let key = cache_key("widgets", &Criteria::new(), &[]);
        assert!(cache.read(key).is_none());

        cache.write(key, &json!({"total": 1}), None, &["widgets".to_string()]);
        assert_eq!(cache.read(key).unwrap()["total"], json!(1));
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = MemoryActionCache::new();
        let key = cache_key("widgets", &Criteria::new(), &[]);
        cache.write(key, &json!({"total": 1}), Some(Duration::ZERO), &[]);
        assert!(cache.read(key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unexpired_ttl_still_serves() {
        let cache = MemoryActionCache::new();
        let key = cache_key("widgets", &Criteria::new(), &[]);
        cache.write(key, &json!({"total": 1}), Some(Duration::from_secs(60)), &[]);
        assert!(cache.read(key).is_some());
    }

    #[test]
    fn test_invalidate_drops_dependent_entries() {
        let cache = MemoryActionCache::new();
        let widgets = cache_key("widgets", &Criteria::new(), &[]);
        let parts = cache_key("parts", &Criteria::new(), &[]);
        cache.write(widgets, &json!(1), None, &["widgets".to_string()]);
        cache.write(parts, &json!(2), None, &["parts".to_string()]);

        cache.invalidate("widgets");
        assert!(cache.read(widgets).is_none());
        assert_eq!(cache.read(parts).unwrap(), json!(2));
    }
}
