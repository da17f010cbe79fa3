mod schema;

use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use rusqlite::{
    functions::FunctionFlags, params, Connection, OptionalExtension, Transaction,
    TransactionBehavior,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{LedgerError, Result},
    identity::UserId,
    month::YearMonth,
};

#[derive(Debug)]
pub struct LedgerStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub schema_version: i32,
    pub banks: i64,
    pub categories: i64,
    pub months: i64,
    pub facts: i64,
}

impl LedgerStore {
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                LedgerError::Unavailable(format!(
                    "failed creating database directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        let store = Self::prepare(conn)?;
        info!(path = %path.display(), "Ledger store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_casefold(&conn)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Unavailable("connection lock poisoned".to_string()))
    }

    pub(crate) fn write<T>(&self, body: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = body(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub(crate) fn read<T>(&self, body: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = body(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.read(|conn| {
            let count = |table: &str| -> Result<i64> {
                Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
            };
            Ok(StoreStats {
                schema_version: conn.query_row(
                    "SELECT version FROM schema_version LIMIT 1",
                    [],
                    |row| row.get(0),
                )?,
                banks: count("banks")?,
                categories: count("categories")?,
                months: count("cashback_months")?,
                facts: count("bank_cashback_categories")?,
            })
        })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    let has_version_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !has_version_table {
        conn.execute_batch(schema::SCHEMA_V1)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema::CURRENT_VERSION],
        )?;
        info!(version = schema::CURRENT_VERSION, "Applied ledger schema");
        return Ok(());
    }

    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if current > schema::CURRENT_VERSION {
        return Err(LedgerError::Unavailable(format!(
            "database schema version {current} is newer than supported version {}",
            schema::CURRENT_VERSION
        )));
    }

    debug!(version = current, "Ledger schema up to date");
    Ok(())
}

fn register_casefold(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )?;
    Ok(())
}

pub(crate) fn find_month_id(conn: &Connection, user: UserId, month: YearMonth) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM cashback_months WHERE user_id = ?1 AND month = ?2",
            params![user.get(), month.storage_key()],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn ensure_month_id(conn: &Connection, user: UserId, month: YearMonth) -> Result<i64> {
    Ok(conn.query_row(
        "INSERT INTO cashback_months (user_id, month) VALUES (?1, ?2)
         ON CONFLICT(user_id, month) DO UPDATE SET month = excluded.month
         RETURNING id",
        params![user.get(), month.storage_key()],
        |row| row.get(0),
    )?)
}
