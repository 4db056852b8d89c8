// Coffer: SQLite database management
//
// Owns the single SQLite connection, applies the schema, and hands out
// transactions. A transaction holds the connection lock for its whole life
// and rolls back on drop unless it was committed.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use super::error::DbError;
use super::tx::{Row, Transaction, TransactionProvider, Value};
use crate::config::DatabaseConfig;
use crate::retry::{do_with_tries, RetryError};

const SCHEMA_UP: &str = "
    CREATE TABLE IF NOT EXISTS vault (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        name    TEXT NOT NULL CHECK (name <> '')
    );

    CREATE TABLE IF NOT EXISTS vault_entry (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        vault_id    INTEGER NOT NULL REFERENCES vault(id) ON DELETE CASCADE,
        key         TEXT NOT NULL CHECK (key <> ''),
        value       TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_vault_entry_vault
        ON vault_entry(vault_id);
";

const SCHEMA_DOWN: &str = "
    DROP INDEX IF EXISTS idx_vault_entry_vault;
    DROP TABLE IF EXISTS vault_entry;
    DROP TABLE IF EXISTS vault;
";

/// SQLite-backed transaction provider.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, DbError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::from_connection(conn)
    }

    /// Open the configured database, retrying as configured.
    pub fn open_with_retries(cfg: &DatabaseConfig) -> Result<Self, RetryError<DbError>> {
        do_with_tries(cfg.attempts, cfg.delay, || {
            tracing::debug!(path = %cfg.path.display(), "database connection attempt");
            Self::open(&cfg.path, cfg.busy_timeout)
        })
    }

    /// Open an in-memory database with the schema applied (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, DbError> {
        let db = Self::from_connection(Connection::open_in_memory()?)?;
        db.migrate_up()?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the tables if they do not exist yet.
    pub fn migrate_up(&self) -> Result<(), DbError> {
        self.lock().execute_batch(SCHEMA_UP)?;
        tracing::debug!("Database migrations applied");
        Ok(())
    }

    /// Drop every table the schema created.
    pub fn migrate_down(&self) -> Result<(), DbError> {
        self.lock().execute_batch(SCHEMA_DOWN)?;
        tracing::debug!("Database migrations reverted");
        Ok(())
    }

    /// Run `f` against the raw connection (for testing only).
    #[cfg(test)]
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.lock())
    }

    // Every transaction rolls back on drop, including during unwinding, so a
    // poisoned lock still guards a consistent connection.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("database lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl TransactionProvider for Database {
    type Tx<'a> = SqliteTx<'a>;

    fn begin(&self) -> Result<SqliteTx<'_>, DbError> {
        let conn = self.lock();
        conn.execute_batch("BEGIN")?;
        Ok(SqliteTx {
            conn,
            finished: false,
        })
    }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// An open SQLite transaction.
pub struct SqliteTx<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl Transaction for SqliteTx<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize, DbError> {
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let first = match rows.next()? {
            Some(row) => Some(scan(row, columns)?),
            None => None,
        };
        Ok(first)
    }

    fn query_rows(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut scanned = Vec::new();
        while let Some(row) = rows.next()? {
            scanned.push(scan(row, columns)?);
        }
        Ok(scanned)
    }

    fn commit(mut self) -> Result<(), DbError> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self) -> Result<(), DbError> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteTx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback of unfinished transaction failed");
            }
        }
    }
}

fn scan(row: &rusqlite::Row<'_>, columns: usize) -> Result<Row, DbError> {
    let mut values = Vec::with_capacity(columns);
    for index in 0..columns {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Text(bytes) => Value::Text(
                std::str::from_utf8(bytes)
                    .map_err(|_| DbError::ColumnType {
                        index,
                        expected: "valid UTF-8 text",
                    })?
                    .to_string(),
            ),
            ValueRef::Real(_) | ValueRef::Blob(_) => {
                return Err(DbError::UnsupportedColumn(index))
            }
        };
        values.push(value);
    }
    Ok(Row::new(values))
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
