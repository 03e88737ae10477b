//! Response DTOs for the flag API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{Flag, UserOverride};

/// A page of results plus the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Response body for GET /flags
pub type FlagListResponse = ListResponse<Flag>;

/// Response body for GET /flags/:flag_id/users
pub type OverrideListResponse = ListResponse<UserOverride>;

/// Plain message body, e.g. for DELETE /flags/:flag_id
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub detail: String,
}

impl MessageResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Configured maximum number of entries
    pub max_size: usize,
    /// Configured TTL in seconds
    pub ttl_seconds: u64,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, max_size: usize, ttl_seconds: u64) -> Self {
        let hit_rate = stats.hit_rate();
        Self {
            stats,
            hit_rate,
            max_size,
            ttl_seconds,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
