//! Cache Module
//!
//! Process-local evaluation cache with TTL expiry, bounded size and targeted
//! invalidation by (flag, user) or by flag.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::{EvaluationCache, FillToken};
