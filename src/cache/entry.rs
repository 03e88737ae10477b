//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with a monotonic expiry.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value and the instant after which it must not be served.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic expiry instant; `None` when `now + ttl` is past what an
    /// `Instant` can represent, in which case the entry never expires
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Strictly after `expires_at`: an entry read at exactly its expiry instant
    /// is still served. With a zero TTL that means the entry is stale on the
    /// first lookup that happens any later than the insertion itself.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("value", now, Duration::from_secs(60));

        assert_eq!(entry.value, "value");
        assert_eq!(entry.expires_at, Some(now + Duration::from_secs(60)));
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u8, now, Duration::from_secs(1));

        assert!(!entry.is_expired(now + Duration::from_millis(999)));
        assert!(entry.is_expired(now + Duration::from_millis(1001)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new((), now, Duration::from_secs(10));

        // Served at exactly expires_at, gone one tick after
        let expires_at = now + Duration::from_secs(10);
        assert!(!entry.is_expired(expires_at));
        assert!(entry.is_expired(expires_at + Duration::from_nanos(1)));
    }

    #[test]
    fn test_zero_ttl() {
        let now = Instant::now();
        let entry = CacheEntry::new((), now, Duration::ZERO);

        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::from_nanos(1)));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new((), now, Duration::from_secs(u64::MAX));

        assert_eq!(entry.expires_at, None);
        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::from_secs(10 * 365 * 24 * 3600)));
    }
}
