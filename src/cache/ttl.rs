//! In-memory TTL cache
//!
//! Memoizes expensive asynchronous computations keyed by string, with
//! per-entry expiration and a bounded footprint. When the store is full,
//! the entry with the oldest creation time is evicted before insertion
//! (creation-order eviction, not LRU).
//!
//! `get_or_compute` does not deduplicate concurrent in-flight misses for
//! the same key: two near-simultaneous misses both run the computation
//! and both write, second write wins. Callers that need single-flight
//! semantics must layer it on top.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::AppResult;
use crate::routes::metrics::record_cache_operation;

/// Entry in the cache with creation and expiration times
struct CacheEntry {
    value: String,
    created_at: Instant,
    expires_at: Instant,
}

/// Cache size introspection for health reporting
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

/// In-memory cache with TTL expiration and capacity-bounded eviction
///
/// Values are stored JSON-serialized so one instance can hold
/// heterogeneous types, mirroring how the route layer uses named caches.
///
/// # Thread Safety
///
/// Uses `RwLock` for interior mutability; no lock is held across an
/// await point.
pub struct TtlCache {
    name: &'static str,
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_size: usize,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    /// Create a cache with the system clock
    pub fn new(name: &'static str, max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(name, max_size, default_ttl, Arc::new(SystemClock))
    }

    /// Create a cache reading time from the given clock
    pub fn with_clock(
        name: &'static str,
        max_size: usize,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            max_size,
            default_ttl,
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a value if present and not expired
    ///
    /// An expired entry is treated as absent and removed as a side effect.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => {
                    let parsed: T = serde_json::from_str(&entry.value)?;
                    record_cache_operation(self.name, "hit");
                    return Ok(Some(parsed));
                }
                Some(_) => {}
                None => {
                    record_cache_operation(self.name, "miss");
                    return Ok(None);
                }
            }
        }

        // Entry was present but expired: drop it under the write lock.
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if now >= entry.expires_at {
                entries.remove(key);
            }
        }
        record_cache_operation(self.name, "expired");
        Ok(None)
    }

    /// Check presence without deserializing
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return true,
                Some(_) => {}
                None => return false,
            }
        }

        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if now >= entry.expires_at {
                entries.remove(key);
            }
        }
        false
    }

    /// Store a value with the default TTL
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Store a value with a custom TTL
    ///
    /// A zero TTL produces an entry that is already expired on the next
    /// `get`. If the store is at capacity and `key` is new, the entry
    /// with the oldest creation time is evicted first, so the store
    /// never exceeds `max_size`.
    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> AppResult<()> {
        let serialized = serde_json::to_string(value)?;
        let now = self.clock.now();

        let mut entries = self.entries.write().unwrap();

        if !entries.contains_key(key) && entries.len() >= self.max_size {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest_key) = oldest {
                debug!(cache = self.name, key = %oldest_key, "Evicting oldest entry at capacity");
                entries.remove(&oldest_key);
                record_cache_operation(self.name, "evict");
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value: serialized,
                created_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    /// Remove an entry; returns whether one was present
    ///
    /// Used for targeted invalidation after a mutation affecting cached data.
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key).is_some()
    }

    /// Return the cached value for `key`, computing and storing it on a miss
    ///
    /// The stored value is always the most recently computed one for the
    /// key, but concurrent misses are NOT deduplicated. If `compute`
    /// fails, nothing is cached and the error propagates untouched.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.get::<T>(key)? {
            return Ok(value);
        }

        debug!(cache = self.name, key = %key, "Cache miss, computing");
        let value = compute().await?;
        self.set_with_ttl(key, &value, ttl)?;
        Ok(value)
    }

    /// Remove every expired entry; returns how many were dropped
    ///
    /// Bounds memory from expired-but-unaccessed entries. Runs on the
    /// background sweeper, not on the request path.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Current size and configured capacity
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap();
        CacheStats {
            size: entries.len(),
            max_size: self.max_size,
        }
    }
}
