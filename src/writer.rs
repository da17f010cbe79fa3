use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

use crate::{
    catalog::{self, CatalogKind},
    error::{LedgerError, Result},
    identity::UserId,
    models::{BankFacts, CategoryPercent},
    month::YearMonth,
    normalize::{required_name, validate_categories, validate_facts, NormalizedFact},
    store::{ensure_month_id, find_month_id, LedgerStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    Replace,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub cleared: usize,
    pub upserted: usize,
}

impl LedgerStore {
    pub fn replace_month(
        &self,
        user: UserId,
        month: YearMonth,
        banks: &[BankFacts],
    ) -> Result<WriteSummary> {
        self.write_month(user, month, banks, WritePolicy::Replace)
    }

    pub fn merge_month(
        &self,
        user: UserId,
        month: YearMonth,
        banks: &[BankFacts],
    ) -> Result<WriteSummary> {
        self.write_month(user, month, banks, WritePolicy::Merge)
    }

    pub fn write_month(
        &self,
        user: UserId,
        month: YearMonth,
        banks: &[BankFacts],
        policy: WritePolicy,
    ) -> Result<WriteSummary> {
        let facts = validate_facts(banks)?;

        let summary = self.write(|tx| {
            let month_id = ensure_month_id(tx, user, month)?;
            let cleared = match policy {
                WritePolicy::Replace => tx.execute(
                    "DELETE FROM bank_cashback_categories WHERE cashback_month_id = ?1",
                    params![month_id],
                )?,
                WritePolicy::Merge => 0,
            };
            let upserted = upsert_facts(tx, month_id, &facts)?;
            Ok(WriteSummary { cleared, upserted })
        })?;

        info!(
            user_id = %user,
            month = %month,
            policy = ?policy,
            cleared = summary.cleared,
            upserted = summary.upserted,
            "Cashback month written"
        );
        Ok(summary)
    }

    pub fn replace_bank_categories(
        &self,
        user: UserId,
        month: YearMonth,
        bank: &str,
        categories: &[CategoryPercent],
    ) -> Result<WriteSummary> {
        let bank = required_name(bank, "bank")?;
        let facts: Vec<NormalizedFact> = validate_categories(&bank, categories)?
            .into_iter()
            .map(|(category, percent)| NormalizedFact {
                bank: bank.clone(),
                category,
                percent,
            })
            .collect();

        let summary = self.write(|tx| {
            let not_found =
                || LedgerError::not_found(format!("bank {bank:?} not found in month {month}"));
            let month_id = find_month_id(tx, user, month)?.ok_or_else(not_found)?;
            let bank_entry = catalog::find(tx, CatalogKind::Bank, &bank)?.ok_or_else(not_found)?;

            let cleared = tx.execute(
                "DELETE FROM bank_cashback_categories WHERE cashback_month_id = ?1 AND bank_id = ?2",
                params![month_id, bank_entry.id],
            )?;
            if cleared == 0 {
                return Err(not_found());
            }
            let upserted = upsert_facts(tx, month_id, &facts)?;
            Ok(WriteSummary { cleared, upserted })
        })?;

        info!(
            user_id = %user,
            month = %month,
            bank = %bank,
            cleared = summary.cleared,
            upserted = summary.upserted,
            "Bank categories replaced"
        );
        Ok(summary)
    }
}

/// Upserts in submission order, so a repeated pair ends with its last percent.
/// Returns the number of distinct `(bank, category)` pairs written.
fn upsert_facts(conn: &Connection, month_id: i64, facts: &[NormalizedFact]) -> Result<usize> {
    let mut bank_ids: HashMap<&str, i64> = HashMap::new();
    let mut category_ids: HashMap<&str, i64> = HashMap::new();
    let mut written: HashSet<(i64, i64)> = HashSet::new();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO bank_cashback_categories (cashback_month_id, bank_id, category_id, percent)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(cashback_month_id, bank_id, category_id)
         DO UPDATE SET percent = excluded.percent",
    )?;

    for fact in facts {
        let bank_id = match bank_ids.get(fact.bank.as_str()) {
            Some(id) => *id,
            None => {
                let id = catalog::resolve(conn, CatalogKind::Bank, &fact.bank)?;
                bank_ids.insert(fact.bank.as_str(), id);
                id
            }
        };
        let category_id = match category_ids.get(fact.category.as_str()) {
            Some(id) => *id,
            None => {
                let id = catalog::resolve(conn, CatalogKind::Category, &fact.category)?;
                category_ids.insert(fact.category.as_str(), id);
                id
            }
        };
        stmt.execute(params![month_id, bank_id, category_id, fact.percent])?;
        written.insert((bank_id, category_id));
    }

    Ok(written.len())
}
