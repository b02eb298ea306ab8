//! Injected verification cache.
//!
//! Outbound notification checks (recipient domain verification) memoize
//! their results through this abstraction instead of a module-level
//! singleton, so lifecycle and bounds are explicit and testable. The
//! [`BoundedCache`] implementation evicts in insertion order once full and
//! treats entries older than its TTL as misses.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// A memoized verification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedVerification {
    pub valid: bool,
    pub checked_at: Timestamp,
}

/// Cache interface for verification results.
pub trait VerificationCache: Send + Sync {
    /// Look up a key; `None` is a miss (absent or expired).
    fn get(&self, key: &str) -> Option<CachedVerification>;

    /// Record a verification result.
    fn put(&self, key: &str, value: CachedVerification);
}

/// Bounded in-memory cache with FIFO eviction and a freshness TTL.
pub struct BoundedCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: HashMap<String, CachedVerification>,
    order: VecDeque<String>,
}

impl BoundedCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Number of live entries (expired entries still count until evicted).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VerificationCache for BoundedCache {
    fn get(&self, key: &str) -> Option<CachedVerification> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let entry = inner.entries.get(key).copied()?;
        if Utc::now() - entry.checked_at > self.ttl {
            return None;
        }
        Some(entry)
    }

    fn put(&self, key: &str, value: CachedVerification) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        if !inner.entries.contains_key(key) {
            if inner.entries.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            inner.order.push_back(key.to_string());
        }
        inner.entries.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(valid: bool) -> CachedVerification {
        CachedVerification {
            valid,
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn hit_after_put() {
        let cache = BoundedCache::new(4, Duration::minutes(10));
        cache.put("example.org", fresh(true));
        let hit = cache.get("example.org").expect("entry should be cached");
        assert!(hit.valid);
    }

    #[test]
    fn miss_when_absent() {
        let cache = BoundedCache::new(4, Duration::minutes(10));
        assert!(cache.get("example.org").is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = BoundedCache::new(4, Duration::minutes(10));
        cache.put(
            "stale.org",
            CachedVerification {
                valid: true,
                checked_at: Utc::now() - Duration::hours(1),
            },
        );
        assert!(cache.get("stale.org").is_none());
    }

    #[test]
    fn evicts_oldest_insertion_at_capacity() {
        let cache = BoundedCache::new(2, Duration::minutes(10));
        cache.put("a.org", fresh(true));
        cache.put("b.org", fresh(true));
        cache.put("c.org", fresh(true));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a.org").is_none());
        assert!(cache.get("b.org").is_some());
        assert!(cache.get("c.org").is_some());
    }

    #[test]
    fn overwrite_does_not_grow() {
        let cache = BoundedCache::new(2, Duration::minutes(10));
        cache.put("a.org", fresh(true));
        cache.put("a.org", fresh(false));
        assert_eq!(cache.len(), 1);
        assert!(!cache.get("a.org").expect("entry should exist").valid);
    }
}
