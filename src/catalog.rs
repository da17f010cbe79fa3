use std::fmt;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::{
    error::Result,
    normalize::required_name,
    store::LedgerStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Bank,
    Category,
}

impl CatalogKind {
    fn table(self) -> &'static str {
        match self {
            Self::Bank => "banks",
            Self::Category => "categories",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

/// Atomic insert-or-get by exact name. The no-op update makes `RETURNING`
/// yield the existing id on conflict.
pub(crate) fn resolve(conn: &Connection, kind: CatalogKind, name: &str) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (name) VALUES (?1)
         ON CONFLICT(name) DO UPDATE SET name = excluded.name
         RETURNING id",
        kind.table()
    );
    Ok(conn.query_row(&sql, params![name], |row| row.get(0))?)
}

pub(crate) fn find(conn: &Connection, kind: CatalogKind, name: &str) -> Result<Option<CatalogEntry>> {
    let sql = format!("SELECT id, name FROM {} WHERE name = ?1", kind.table());
    Ok(conn
        .query_row(&sql, params![name], |row| {
            Ok(CatalogEntry {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?)
}

impl LedgerStore {
    pub fn resolve_catalog(&self, kind: CatalogKind, name: &str) -> Result<i64> {
        let name = required_name(name, kind.label())?;
        self.write(|tx| resolve(tx, kind, &name))
    }

    pub fn find_catalog(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogEntry>> {
        let name = required_name(name, kind.label())?;
        self.read(|tx| find(tx, kind, &name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_idempotent() {
        let store = LedgerStore::open_in_memory().expect("store");
        let first = store.resolve_catalog(CatalogKind::Bank, "Sber").expect("resolve");
        let again = store.resolve_catalog(CatalogKind::Bank, "  Sber ").expect("resolve");
        assert_eq!(first, again);
        assert_eq!(store.stats().expect("stats").banks, 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let store = LedgerStore::open_in_memory().expect("store");
        let upper = store.resolve_catalog(CatalogKind::Category, "Taxi").expect("resolve");
        let lower = store.resolve_catalog(CatalogKind::Category, "taxi").expect("resolve");
        assert_ne!(upper, lower);
    }

    #[test]
    fn kinds_use_separate_catalogs() {
        let store = LedgerStore::open_in_memory().expect("store");
        store.resolve_catalog(CatalogKind::Bank, "Ozon").expect("resolve");
        assert!(store
            .find_catalog(CatalogKind::Category, "Ozon")
            .expect("find")
            .is_none());
        let bank = store
            .find_catalog(CatalogKind::Bank, "Ozon")
            .expect("find")
            .expect("present");
        assert_eq!(bank.name, "Ozon");
    }

    #[test]
    fn blank_names_are_rejected() {
        let store = LedgerStore::open_in_memory().expect("store");
        let err = store
            .resolve_catalog(CatalogKind::Bank, " \u{a0} ")
            .expect_err("blank");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(store.stats().expect("stats").banks, 0);
    }
}
