//! Cache Store Module
//!
//! The evaluation cache: an insertion-ordered map guarded by a single mutex,
//! with lazy TTL expiry, one-in-one-out eviction at capacity and targeted
//! invalidation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::cache::{CacheEntry, CacheKey, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::models::Evaluation;

// == Fill Token ==
/// Proof that a miss was observed at a given invalidation generation.
///
/// Taken before the database read on a miss and handed back to
/// [`EvaluationCache::set_if_fresh`]. If any invalidation ran in between, the
/// fill is dropped instead of caching a value computed from stale rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillToken {
    key: CacheKey,
    generation: u64,
}

#[derive(Debug)]
struct Inner<V> {
    entries: IndexMap<CacheKey, CacheEntry<V>>,
    stats: CacheStats,
    /// Bumped by every invalidation call, hit or miss
    generation: u64,
}

// == Evaluation Cache ==
/// Bounded, TTL-expiring cache of flag evaluations keyed by (flag, user).
///
/// Every operation takes the same lock for its whole body, so operations are
/// linearizable with respect to each other. Nothing here blocks on I/O.
#[derive(Debug)]
pub struct EvaluationCache<V = Evaluation> {
    inner: Mutex<Inner<V>>,
    max_size: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> EvaluationCache<V> {
    // == Constructors ==
    /// Creates a cache on the system monotonic clock.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self::with_clock(max_size, ttl, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    ///
    /// A `max_size` of zero is raised to one.
    pub fn with_clock(max_size: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        if max_size == 0 {
            warn!("Evaluation cache max_size of 0 is not allowed, using 1");
        }

        Self {
            inner: Mutex::new(Inner {
                entries: IndexMap::new(),
                stats: CacheStats::new(),
                generation: 0,
            }),
            max_size: max_size.max(1),
            ttl,
            clock,
        }
    }

    /// Creates a cache sized and timed from the service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_max_size, config.cache_ttl())
    }

    // == Get ==
    /// Returns the cached value for (flag, user) if present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, flag_id: Uuid, user_id: &str) -> Option<V> {
        let key = CacheKey::new(flag_id, user_id);
        let now = self.clock.now();
        let mut inner = self.lock();

        match inner.entries.get(&key).map(|entry| entry.is_expired(now)) {
            None => {
                inner.stats.record_miss();
                None
            }
            Some(true) => {
                inner.entries.shift_remove(&key);
                inner.stats.record_expiration();
                inner.stats.record_miss();
                let remaining = inner.entries.len();
                inner.stats.set_total_entries(remaining);
                trace!(%key, "Evaluation cache entry expired");
                None
            }
            Some(false) => {
                inner.stats.record_hit();
                inner.entries.get(&key).map(|entry| entry.value.clone())
            }
        }
    }

    // == Set ==
    /// Stores `value` for (flag, user), expiring `ttl` from now.
    ///
    /// An existing key is overwritten in place. A new key at capacity first
    /// removes the oldest expired entry, or failing that the entry at the
    /// front of insertion order.
    pub fn set(&self, flag_id: Uuid, user_id: &str, value: V) {
        let now = self.clock.now();
        let mut inner = self.lock();
        self.insert_locked(&mut inner, CacheKey::new(flag_id, user_id), value, now);
    }

    // == Fenced Fill ==
    /// Captures the current invalidation generation for a pending fill.
    pub fn fill_token(&self, flag_id: Uuid, user_id: &str) -> FillToken {
        let inner = self.lock();
        FillToken {
            key: CacheKey::new(flag_id, user_id),
            generation: inner.generation,
        }
    }

    /// Stores `value` only if no invalidation happened since `token` was taken.
    ///
    /// Returns whether the value was cached.
    pub fn set_if_fresh(&self, token: FillToken, value: V) -> bool {
        let now = self.clock.now();
        let mut inner = self.lock();

        if inner.generation != token.generation {
            inner.stats.record_rejected_fill();
            debug!(key = %token.key, "Dropping evaluation fill raced by an invalidation");
            return false;
        }

        self.insert_locked(&mut inner, token.key, value, now);
        true
    }

    // == Invalidation ==
    /// Removes the entry for exactly (flag, user). No-op if absent.
    pub fn invalidate_one(&self, flag_id: Uuid, user_id: &str) {
        let key = CacheKey::new(flag_id, user_id);
        let mut inner = self.lock();
        inner.generation += 1;

        if inner.entries.shift_remove(&key).is_some() {
            inner.stats.record_invalidations(1);
            let remaining = inner.entries.len();
            inner.stats.set_total_entries(remaining);
            debug!(%key, "Invalidated evaluation cache entry");
        }
    }

    /// Removes every entry of `flag_id`, whatever the user.
    ///
    /// Full scan of resident keys; there is no flag → users index.
    pub fn invalidate_all_for_flag(&self, flag_id: Uuid) {
        let mut inner = self.lock();
        inner.generation += 1;

        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.is_for_flag(&flag_id));
        let removed = before - inner.entries.len();

        inner.stats.record_invalidations(removed);
        let remaining = inner.entries.len();
        inner.stats.set_total_entries(remaining);
        debug!(%flag_id, removed, "Invalidated evaluation cache entries for flag");
    }

    // == Introspection ==
    /// Number of resident entries, expired ones included until discovered.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Internals ==
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // Every mutation leaves the map consistent before anything can panic
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_locked(&self, inner: &mut Inner<V>, key: CacheKey, value: V, now: Instant) {
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_size {
            Self::make_room(inner, now);
        }

        inner
            .entries
            .insert(key, CacheEntry::new(value, now, self.ttl));
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);
    }

    fn make_room(inner: &mut Inner<V>, now: Instant) {
        let expired = inner
            .entries
            .values()
            .position(|entry| entry.is_expired(now));

        match expired {
            Some(index) => {
                inner.entries.shift_remove_index(index);
                inner.stats.record_expiration();
            }
            None => {
                if let Some((evicted, _)) = inner.entries.shift_remove_index(0) {
                    inner.stats.record_eviction();
                    trace!(key = %evicted, "Evicted evaluation cache entry at capacity");
                }
            }
        }
    }
}
