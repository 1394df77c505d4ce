use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, Transaction};
use tracing::debug;

use fintrack_core::{CoreError, LedgerStore, PurgeReport, Reconciliation};
use fintrack_domain::{
    Amount, Budget, BudgetId, Entry, EntryChanges, EntryId, EntryKind, NewBudget, NewEntry, User,
    UserId,
};

use crate::{schema, StorageError};

const ENTRY_COLUMNS: &str = "id, uid, title, amount, category, date, note, timestamp";
const BUDGET_COLUMNS: &str = "id, uid, category, limit_amount, start_date, end_date";

/// SQLite-backed [`LedgerStore`].
///
/// Holds the single connection of the process; services share the store
/// through an `Arc`. Compound writes run inside one SQLite transaction.
#[derive(Debug)]
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteLedgerStore {
    /// Opens (or creates) the database file and brings its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut conn = Connection::open(path)?;
        let found = schema::prepare(&mut conn)?;
        debug!(path = %path.display(), found_version = found, "ledger database opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory()?;
        schema::prepare(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        schema::detect_version(&conn)
    }

    /// Closes the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<(), StorageError> {
        let conn = self.conn.into_inner().map_err(|_| StorageError::Poisoned)?;
        conn.close().map_err(|(_, err)| StorageError::Sqlite(err))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StorageError>,
    ) -> Result<T, CoreError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut conn).map_err(CoreError::from)
    }
}

fn table(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Expense => "expenses",
        EntryKind::Income => "income",
    }
}

fn user_exists(tx: &Transaction<'_>, uid: &UserId) -> Result<bool, StorageError> {
    Ok(tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uid = ?1)",
        params![uid.as_str()],
        |row| row.get(0),
    )?)
}

fn read_total(tx: &Transaction<'_>, uid: &UserId) -> Result<Amount, StorageError> {
    tx.query_row(
        "SELECT total FROM users WHERE uid = ?1",
        params![uid.as_str()],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .map(Amount::new)
    .ok_or_else(|| StorageError::UnknownUser(uid.clone()))
}

/// Stores a total already checked for overflow.
fn write_total(tx: &Transaction<'_>, uid: &UserId, total: Amount) -> Result<(), StorageError> {
    tx.execute(
        "UPDATE users SET total = ?1 WHERE uid = ?2",
        params![total.units(), uid.as_str()],
    )?;
    Ok(())
}

fn select_entry(
    conn: &Connection,
    kind: EntryKind,
    id: EntryId,
) -> Result<Option<Entry>, StorageError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM {} WHERE id = ?1", table(kind));
    Ok(conn.query_row(&sql, params![id.0], entry_from_row).optional()?)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let millis: i64 = row.get(7)?;
    Ok(Entry {
        id: EntryId(row.get(0)?),
        uid: UserId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        amount: Amount::new(row.get(3)?),
        category: row.get(4)?,
        date: row.get::<_, NaiveDate>(5)?,
        note: row.get(6)?,
        timestamp: DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                Type::Integer,
                format!("timestamp {millis} out of range").into(),
            )
        })?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: BudgetId(row.get(0)?),
        uid: UserId::new(row.get::<_, String>(1)?),
        category: row.get(2)?,
        limit: Amount::new(row.get(3)?),
        start_date: row.get(4)?,
        end_date: row.get(5)?,
    })
}

impl LedgerStore for SqliteLedgerStore {
    fn insert_user(&self, user: &User) -> Result<bool, CoreError> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (uid, name, total) VALUES (?1, ?2, ?3)",
                params![user.uid.as_str(), user.name, user.total.units()],
            )?;
            Ok(inserted == 1)
        })
    }

    fn get_user(&self, uid: &UserId) -> Result<Option<User>, CoreError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT uid, name, total FROM users WHERE uid = ?1",
                    params![uid.as_str()],
                    |row| {
                        Ok(User {
                            uid: UserId::new(row.get::<_, String>(0)?),
                            name: row.get(1)?,
                            total: Amount::new(row.get(2)?),
                        })
                    },
                )
                .optional()?)
        })
    }

    fn insert_entry(
        &self,
        kind: EntryKind,
        entry: &NewEntry,
        timestamp: DateTime<Utc>,
    ) -> Result<Entry, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let total = kind
                .apply_to(read_total(&tx, &entry.uid)?, entry.amount)
                .ok_or_else(|| StorageError::BalanceOverflow(entry.uid.clone()))?;
            let mut stored = entry.clone().into_entry(EntryId(0), timestamp);
            tx.execute(
                &format!(
                    "INSERT INTO {} (uid, title, amount, category, date, note, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    table(kind)
                ),
                params![
                    stored.uid.as_str(),
                    stored.title,
                    stored.amount.units(),
                    stored.category,
                    stored.date,
                    stored.note,
                    stored.timestamp.timestamp_millis(),
                ],
            )?;
            stored.id = EntryId(tx.last_insert_rowid());
            write_total(&tx, &stored.uid, total)?;
            tx.commit()?;
            Ok(stored)
        })
    }

    fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError> {
        self.with_conn(|conn| select_entry(conn, kind, id))
    }

    fn update_entry(
        &self,
        kind: EntryKind,
        id: EntryId,
        changes: &EntryChanges,
    ) -> Result<Option<Entry>, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let Some(mut entry) = select_entry(&tx, kind, id)? else {
                return Ok(None);
            };
            let previous = entry.amount;
            changes.apply_to(&mut entry);
            let total = kind
                .revert_from(read_total(&tx, &entry.uid)?, previous)
                .and_then(|total| kind.apply_to(total, entry.amount))
                .ok_or_else(|| StorageError::BalanceOverflow(entry.uid.clone()))?;
            tx.execute(
                &format!(
                    "UPDATE {} SET title = ?1, amount = ?2, category = ?3, date = ?4, note = ?5
                     WHERE id = ?6",
                    table(kind)
                ),
                params![
                    entry.title,
                    entry.amount.units(),
                    entry.category,
                    entry.date,
                    entry.note,
                    id.0,
                ],
            )?;
            write_total(&tx, &entry.uid, total)?;
            tx.commit()?;
            Ok(Some(entry))
        })
    }

    fn delete_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<Entry>, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let Some(entry) = select_entry(&tx, kind, id)? else {
                return Ok(None);
            };
            let total = kind
                .revert_from(read_total(&tx, &entry.uid)?, entry.amount)
                .ok_or_else(|| StorageError::BalanceOverflow(entry.uid.clone()))?;
            tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table(kind)),
                params![id.0],
            )?;
            write_total(&tx, &entry.uid, total)?;
            tx.commit()?;
            Ok(Some(entry))
        })
    }

    fn list_entries(&self, uid: &UserId, kind: EntryKind) -> Result<Vec<Entry>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM {} WHERE uid = ?1 ORDER BY id",
                table(kind)
            ))?;
            let rows = stmt.query_map(params![uid.as_str()], entry_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn insert_budget(&self, budget: &NewBudget) -> Result<Budget, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            if !user_exists(&tx, &budget.uid)? {
                return Err(StorageError::UnknownUser(budget.uid.clone()));
            }
            tx.execute(
                "INSERT INTO budgets (uid, category, limit_amount, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    budget.uid.as_str(),
                    budget.category,
                    budget.limit.units(),
                    budget.range.start,
                    budget.range.end,
                ],
            )?;
            let id = BudgetId(tx.last_insert_rowid());
            tx.commit()?;
            Ok(budget.clone().into_budget(id))
        })
    }

    fn list_budgets(&self, uid: &UserId) -> Result<Vec<Budget>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BUDGET_COLUMNS} FROM budgets WHERE uid = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![uid.as_str()], budget_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn update_budget_limit(
        &self,
        uid: &UserId,
        category: &str,
        limit: Amount,
    ) -> Result<usize, CoreError> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE budgets SET limit_amount = ?1 WHERE uid = ?2 AND category = ?3",
                params![limit.units(), uid.as_str(), category],
            )?)
        })
    }

    fn delete_budgets(&self, uid: &UserId, category: &str) -> Result<usize, CoreError> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM budgets WHERE uid = ?1 AND category = ?2",
                params![uid.as_str(), category],
            )?)
        })
    }

    fn purge_user_data(&self, uid: &UserId) -> Result<PurgeReport, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let previous_total = tx
                .query_row(
                    "SELECT total FROM users WHERE uid = ?1",
                    params![uid.as_str()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .map(Amount::new);
            let report = PurgeReport {
                expenses: tx.execute("DELETE FROM expenses WHERE uid = ?1", params![uid.as_str()])?,
                income: tx.execute("DELETE FROM income WHERE uid = ?1", params![uid.as_str()])?,
                budgets: tx.execute("DELETE FROM budgets WHERE uid = ?1", params![uid.as_str()])?,
                previous_total,
            };
            tx.execute(
                "UPDATE users SET total = 0 WHERE uid = ?1",
                params![uid.as_str()],
            )?;
            tx.commit()?;
            Ok(report)
        })
    }

    fn reconcile_total(&self, uid: &UserId) -> Result<Option<Reconciliation>, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let stored = tx
                .query_row(
                    "SELECT total FROM users WHERE uid = ?1",
                    params![uid.as_str()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            let Some(stored) = stored else {
                return Ok(None);
            };
            let mut computed = Amount::ZERO;
            for kind in EntryKind::ALL {
                let sum: i64 = tx.query_row(
                    &format!(
                        "SELECT COALESCE(SUM(amount), 0) FROM {} WHERE uid = ?1",
                        table(kind)
                    ),
                    params![uid.as_str()],
                    |row| row.get(0),
                )?;
                computed = kind
                    .apply_to(computed, Amount::new(sum))
                    .ok_or_else(|| StorageError::BalanceOverflow(uid.clone()))?;
            }
            tx.execute(
                "UPDATE users SET total = ?1 WHERE uid = ?2",
                params![computed.units(), uid.as_str()],
            )?;
            tx.commit()?;
            Ok(Some(Reconciliation {
                stored: Amount::new(stored),
                computed,
            }))
        })
    }
}
