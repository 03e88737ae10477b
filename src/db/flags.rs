//! Flag table queries.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{FlagError, Result};
use crate::models::{CreateFlagRequest, Flag, PageQuery, UpdateFlagRequest};

const COLUMNS: &str = "id, name, description, is_enabled, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Flag> {
    Ok(Flag {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_enabled: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Maps a unique-name violation to a conflict, anything else to a database error.
fn name_conflict(err: rusqlite::Error, name: &str) -> FlagError {
    if FlagError::is_constraint_violation(&err) {
        FlagError::duplicate_name(name)
    } else {
        FlagError::Database(err)
    }
}

pub fn insert(conn: &Connection, req: &CreateFlagRequest) -> Result<Flag> {
    let now = Utc::now();
    let flag = Flag {
        id: Uuid::new_v4(),
        name: req.name.clone(),
        description: req.description.clone(),
        is_enabled: req.is_enabled,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO feature_flags (id, name, description, is_enabled, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            flag.id,
            flag.name,
            flag.description,
            flag.is_enabled,
            flag.created_at,
            flag.updated_at
        ],
    )
    .map_err(|e| name_conflict(e, &flag.name))?;

    Ok(flag)
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Flag>> {
    let flag = conn
        .query_row(
            &format!("SELECT {} FROM feature_flags WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(flag)
}

pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Flag>> {
    let flag = conn
        .query_row(
            &format!("SELECT {} FROM feature_flags WHERE name = ?1", COLUMNS),
            params![name],
            from_row,
        )
        .optional()?;
    Ok(flag)
}

/// Returns one page of flags, newest first, and the total matching count.
pub fn list(conn: &Connection, page: &PageQuery, enabled_only: bool) -> Result<(Vec<Flag>, u64)> {
    let filter = if enabled_only {
        "WHERE is_enabled = 1"
    } else {
        ""
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM feature_flags {} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
        COLUMNS, filter
    ))?;
    let items = stmt
        .query_map(params![page.limit, page.skip], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM feature_flags {}", filter),
        [],
        |row| row.get(0),
    )?;

    Ok((items, total as u64))
}

/// Applies the fields present in `req`. Returns `None` if the flag does not exist.
pub fn update(conn: &Connection, id: Uuid, req: &UpdateFlagRequest) -> Result<Option<Flag>> {
    let Some(mut flag) = get(conn, id)? else {
        return Ok(None);
    };

    if let Some(name) = &req.name {
        flag.name = name.clone();
    }
    if let Some(description) = &req.description {
        flag.description = description.clone();
    }
    if let Some(is_enabled) = req.is_enabled {
        flag.is_enabled = is_enabled;
    }
    flag.updated_at = Utc::now();

    conn.execute(
        "UPDATE feature_flags SET name = ?1, description = ?2, is_enabled = ?3, updated_at = ?4
         WHERE id = ?5",
        params![flag.name, flag.description, flag.is_enabled, flag.updated_at, flag.id],
    )
    .map_err(|e| name_conflict(e, &flag.name))?;

    Ok(Some(flag))
}

pub fn set_enabled(conn: &Connection, id: Uuid, is_enabled: bool) -> Result<Option<Flag>> {
    update(
        conn,
        id,
        &UpdateFlagRequest {
            is_enabled: Some(is_enabled),
            ..Default::default()
        },
    )
}

/// Deletes the flag and, by cascade, its overrides. Returns the deleted flag.
pub fn delete(conn: &Connection, id: Uuid) -> Result<Option<Flag>> {
    let Some(flag) = get(conn, id)? else {
        return Ok(None);
    };

    conn.execute("DELETE FROM feature_flags WHERE id = ?1", params![id])?;
    Ok(Some(flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::overrides;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        conn.execute_batch(crate::db::SCHEMA).unwrap();
        conn
    }

    fn create(conn: &Connection, name: &str, is_enabled: bool) -> Flag {
        insert(
            conn,
            &CreateFlagRequest {
                name: name.to_string(),
                description: Some("A test flag".to_string()),
                is_enabled,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let conn = open();
        let flag = create(&conn, "dark_mode", false);

        let by_id = get(&conn, flag.id).unwrap().unwrap();
        assert_eq!(by_id, flag);

        let by_name = get_by_name(&conn, "dark_mode").unwrap().unwrap();
        assert_eq!(by_name.id, flag.id);

        assert!(get(&conn, Uuid::new_v4()).unwrap().is_none());
        assert!(get_by_name(&conn, "DARK_MODE").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let conn = open();
        create(&conn, "dup", false);

        let err = insert(
            &conn,
            &CreateFlagRequest {
                name: "dup".to_string(),
                description: None,
                is_enabled: true,
            },
        )
        .unwrap_err();
        assert!(matches!(err, FlagError::Conflict(msg) if msg.contains("already exists")));
    }

    #[test]
    fn test_list_pagination_and_filter() {
        let conn = open();
        create(&conn, "one", true);
        create(&conn, "two", false);
        create(&conn, "three", true);

        let (items, total) = list(&conn, &PageQuery::default(), false).unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = items.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["three", "two", "one"]);

        let (items, total) = list(&conn, &PageQuery { skip: 1, limit: 1 }, false).unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "two");

        let (items, total) = list(&conn, &PageQuery::default(), true).unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|f| f.is_enabled));
    }

    #[test]
    fn test_update_applies_present_fields() {
        let conn = open();
        let flag = create(&conn, "upd", false);

        let req = UpdateFlagRequest {
            description: Some(None),
            is_enabled: Some(true),
            ..Default::default()
        };
        let updated = update(&conn, flag.id, &req).unwrap().unwrap();
        assert_eq!(updated.name, "upd");
        assert!(updated.description.is_none());
        assert!(updated.is_enabled);
        assert!(updated.updated_at >= flag.updated_at);

        assert_eq!(get(&conn, flag.id).unwrap().unwrap(), updated);
        assert!(update(&conn, Uuid::new_v4(), &req).unwrap().is_none());
    }

    #[test]
    fn test_update_rename_conflict() {
        let conn = open();
        create(&conn, "taken", false);
        let flag = create(&conn, "free", false);

        let req = UpdateFlagRequest {
            name: Some("taken".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update(&conn, flag.id, &req),
            Err(FlagError::Conflict(_))
        ));
    }

    #[test]
    fn test_set_enabled() {
        let conn = open();
        let flag = create(&conn, "tog", false);

        let toggled = set_enabled(&conn, flag.id, true).unwrap().unwrap();
        assert!(toggled.is_enabled);
        assert!(set_enabled(&conn, Uuid::new_v4(), true).unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades_overrides() {
        let conn = open();
        let flag = create(&conn, "del", false);
        overrides::upsert(&conn, flag.id, "user_1", true).unwrap();

        let deleted = delete(&conn, flag.id).unwrap().unwrap();
        assert_eq!(deleted.name, "del");
        assert!(get(&conn, flag.id).unwrap().is_none());
        assert!(overrides::get(&conn, flag.id, "user_1").unwrap().is_none());

        assert!(delete(&conn, flag.id).unwrap().is_none());
    }
}
