//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of evaluations the cache can hold
    pub cache_max_size: usize,
    /// TTL in seconds applied to every cached evaluation
    pub cache_ttl_seconds: u64,
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// Path prefix for the flag API routes
    pub api_prefix: String,
}

const DEFAULT_CACHE_MAX_SIZE: usize = 10_000;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 60;
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_DATABASE_PATH: &str = "feature_flags.db";
const DEFAULT_API_PREFIX: &str = "/api/v1";

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Ensures a leading slash and no trailing slash; an empty prefix stays empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cached evaluations, must be positive (default: 10000)
    /// - `CACHE_TTL_SECONDS` - Evaluation TTL in seconds, 0 disables reuse (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `DATABASE_PATH` - SQLite file path (default: feature_flags.db)
    /// - `API_PREFIX` - Route prefix (default: /api/v1)
    pub fn from_env() -> Self {
        Self {
            cache_max_size: parse_var::<usize>("CACHE_MAX_SIZE")
                .filter(|&size| size > 0)
                .unwrap_or(DEFAULT_CACHE_MAX_SIZE),
            cache_ttl_seconds: parse_var("CACHE_TTL_SECONDS").unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
            server_port: parse_var("SERVER_PORT").unwrap_or(DEFAULT_SERVER_PORT),
            database_path: env::var("DATABASE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            api_prefix: normalize_prefix(
                &env::var("API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string()),
            ),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            server_port: DEFAULT_SERVER_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }
}
