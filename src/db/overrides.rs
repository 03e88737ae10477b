//! Per-user override table queries.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PageQuery, UserOverride};

const COLUMNS: &str = "id, flag_id, user_id, is_enabled, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<UserOverride> {
    Ok(UserOverride {
        id: row.get(0)?,
        flag_id: row.get(1)?,
        user_id: row.get(2)?,
        is_enabled: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn get(conn: &Connection, flag_id: Uuid, user_id: &str) -> Result<Option<UserOverride>> {
    let found = conn
        .query_row(
            &format!(
                "SELECT {} FROM flag_user_overrides WHERE flag_id = ?1 AND user_id = ?2",
                COLUMNS
            ),
            params![flag_id, user_id],
            from_row,
        )
        .optional()?;
    Ok(found)
}

/// Creates or replaces the override. The flag must exist.
///
/// Returns the stored override and whether it was newly created.
pub fn upsert(
    conn: &Connection,
    flag_id: Uuid,
    user_id: &str,
    is_enabled: bool,
) -> Result<(UserOverride, bool)> {
    let now = Utc::now();

    if let Some(mut existing) = get(conn, flag_id, user_id)? {
        existing.is_enabled = is_enabled;
        existing.updated_at = now;
        conn.execute(
            "UPDATE flag_user_overrides SET is_enabled = ?1, updated_at = ?2 WHERE id = ?3",
            params![existing.is_enabled, existing.updated_at, existing.id],
        )?;
        return Ok((existing, false));
    }

    let created = UserOverride {
        id: Uuid::new_v4(),
        flag_id,
        user_id: user_id.to_string(),
        is_enabled,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO flag_user_overrides (id, flag_id, user_id, is_enabled, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            created.id,
            created.flag_id,
            created.user_id,
            created.is_enabled,
            created.created_at,
            created.updated_at
        ],
    )?;
    Ok((created, true))
}

/// Returns whether an override was removed.
pub fn delete(conn: &Connection, flag_id: Uuid, user_id: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM flag_user_overrides WHERE flag_id = ?1 AND user_id = ?2",
        params![flag_id, user_id],
    )?;
    Ok(removed > 0)
}

/// Returns one page of a flag's overrides, newest first, and their total count.
pub fn list(conn: &Connection, flag_id: Uuid, page: &PageQuery) -> Result<(Vec<UserOverride>, u64)> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM flag_user_overrides WHERE flag_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
        COLUMNS
    ))?;
    let items = stmt
        .query_map(params![flag_id, page.limit, page.skip], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM flag_user_overrides WHERE flag_id = ?1",
        params![flag_id],
        |row| row.get(0),
    )?;

    Ok((items, total as u64))
}
