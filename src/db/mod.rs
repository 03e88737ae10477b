//! Database Module
//!
//! SQLite persistence for flags and per-user overrides. Queries are plain
//! synchronous functions over a `&Connection`; the shared connection lives
//! behind an async mutex in [`Database`].

pub mod flags;
pub mod overrides;

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::Result;
use crate::models::{Evaluation, Flag};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS feature_flags (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        is_enabled INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flag_user_overrides (
        id BLOB PRIMARY KEY,
        flag_id BLOB NOT NULL REFERENCES feature_flags(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        is_enabled INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CONSTRAINT uq_flag_user UNIQUE (flag_id, user_id)
    );

    CREATE INDEX IF NOT EXISTS idx_flags_created ON feature_flags(created_at);
    CREATE INDEX IF NOT EXISTS idx_overrides_flag ON flag_user_overrides(flag_id);
    CREATE INDEX IF NOT EXISTS idx_overrides_user ON flag_user_overrides(user_id);
"#;

/// Shared handle to the flag database.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        info!("Opened flag database at {}", path);
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Cascading override deletes rely on this; it is per-connection
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Waits for exclusive use of the connection.
    pub async fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

/// Computes the effective state of `flag` for `user_id` from current rows.
///
/// This is the fresh value the evaluation cache is filled with on a miss.
pub fn compute_evaluation(conn: &Connection, flag: &Flag, user_id: &str) -> Result<Evaluation> {
    let user_override = overrides::get(conn, flag.id, user_id)?;
    Ok(Evaluation::resolve(flag, user_id, user_override.as_ref()))
}
