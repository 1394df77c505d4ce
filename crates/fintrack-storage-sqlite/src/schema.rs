//! On-disk layout and its versioning.
//!
//! The version lives in `PRAGMA user_version`. Version 1 stored entries without
//! a creation timestamp; version 2 adds `timestamp` (epoch milliseconds, default 0)
//! to `expenses` and `income`.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::StorageError;

pub const SCHEMA_VERSION: i64 = 2;

const USERS_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    uid   TEXT PRIMARY KEY NOT NULL,
    name  TEXT NOT NULL,
    total INTEGER NOT NULL DEFAULT 0
);";

const BUDGETS_SQL: &str = "
CREATE TABLE IF NOT EXISTS budgets (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    uid          TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
    category     TEXT NOT NULL,
    limit_amount INTEGER NOT NULL,
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_budgets_uid_category ON budgets(uid, category);";

const ENTRY_TABLES: [&str; 2] = ["expenses", "income"];

fn entry_table_sql(table: &str, with_timestamp: bool) -> String {
    let timestamp = if with_timestamp {
        ",\n    timestamp INTEGER NOT NULL DEFAULT 0"
    } else {
        ""
    };
    format!(
        "
CREATE TABLE IF NOT EXISTS {table} (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    uid      TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
    title    TEXT NOT NULL,
    amount   INTEGER NOT NULL,
    category TEXT NOT NULL,
    date     TEXT NOT NULL,
    note     TEXT{timestamp}
);
CREATE INDEX IF NOT EXISTS idx_{table}_uid ON {table}(uid);"
    )
}

/// Applies connection pragmas and brings the schema to [`SCHEMA_VERSION`].
///
/// Returns the version found on disk before any change.
pub fn prepare(conn: &mut Connection) -> Result<i64, StorageError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let found = detect_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == 0 {
        let tx = conn.transaction()?;
        initialize(&tx)?;
        tx.commit()?;
    } else if found < SCHEMA_VERSION {
        let tx = conn.transaction()?;
        upgrade(&tx, found, SCHEMA_VERSION)?;
        tx.commit()?;
    } else {
        debug!(version = found, "schema up to date");
    }
    Ok(found)
}

/// Creates all four tables at the current version.
pub fn initialize(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(USERS_SQL)?;
    for table in ENTRY_TABLES {
        conn.execute_batch(&entry_table_sql(table, true))?;
    }
    conn.execute_batch(BUDGETS_SQL)?;
    set_version(conn, SCHEMA_VERSION)?;
    info!(version = SCHEMA_VERSION, "schema created");
    Ok(())
}

/// Applies the additive migrations between `old` and `new`.
///
/// Same-version calls do nothing, and re-running a step that already happened
/// is harmless because column presence is checked first.
pub fn upgrade(conn: &Connection, old: i64, new: i64) -> Result<(), StorageError> {
    if old >= new {
        return Ok(());
    }
    if old < 2 && new >= 2 {
        for table in ENTRY_TABLES {
            if !has_column(conn, table, "timestamp")? {
                conn.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN timestamp INTEGER NOT NULL DEFAULT 0;"
                ))?;
            }
        }
    }
    set_version(conn, new)?;
    info!(from = old, to = new, "schema upgraded");
    Ok(())
}

/// Reads `user_version`; an unversioned file that already holds the tables is
/// treated as version 1.
pub fn detect_version(conn: &Connection) -> Result<i64, StorageError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version != 0 {
        return Ok(version);
    }
    let legacy = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(if legacy.is_some() { 1 } else { 0 })
}

fn set_version(conn: &Connection, version: i64) -> Result<(), StorageError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_v1(conn: &Connection) {
        conn.execute_batch(USERS_SQL).unwrap();
        for table in ENTRY_TABLES {
            conn.execute_batch(&entry_table_sql(table, false)).unwrap();
        }
        conn.execute_batch(BUDGETS_SQL).unwrap();
        conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    }

    #[test]
    fn fresh_database_is_created_at_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(prepare(&mut conn).unwrap(), 0);
        assert_eq!(detect_version(&conn).unwrap(), SCHEMA_VERSION);
        for table in ENTRY_TABLES {
            assert!(has_column(&conn, table, "timestamp").unwrap());
        }
    }

    #[test]
    fn version_one_gains_timestamp_with_zero_default() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_v1(&conn);
        conn.execute("INSERT INTO users (uid, name, total) VALUES ('u1', 'Ada', 0)", [])
            .unwrap();
        conn.execute(
            "INSERT INTO expenses (uid, title, amount, category, date) VALUES ('u1', 'Tea', 3, 'Food', '2023-01-01')",
            [],
        )
        .unwrap();

        assert_eq!(prepare(&mut conn).unwrap(), 1);
        let timestamp: i64 = conn
            .query_row("SELECT timestamp FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timestamp, 0);
        assert_eq!(detect_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn upgrade_is_idempotent_and_same_version_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1(&conn);
        upgrade(&conn, 1, 2).unwrap();
        upgrade(&conn, 1, 2).unwrap();
        upgrade(&conn, 2, 2).unwrap();
        assert_eq!(detect_version(&conn).unwrap(), 2);
    }

    #[test]
    fn unversioned_legacy_file_is_treated_as_version_one() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1(&conn);
        conn.execute_batch("PRAGMA user_version = 0;").unwrap();
        assert_eq!(detect_version(&conn).unwrap(), 1);
    }

    #[test]
    fn newer_schema_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 9;").unwrap();
        let err = prepare(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedSchema { found: 9, supported: SCHEMA_VERSION }
        ));
    }
}
