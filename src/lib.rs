//! Feature Flags - A feature flag service with a cached evaluation path
//!
//! Flags and per-user overrides live in SQLite; evaluations are memoized in a
//! bounded in-memory cache with TTL expiration and targeted invalidation.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, EvaluationCache};
pub use config::Config;
pub use db::Database;
pub use error::{FlagError, Result};
