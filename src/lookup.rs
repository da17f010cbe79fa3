use rusqlite::params;
use tracing::debug;

use crate::{
    error::Result,
    identity::UserId,
    models::{Bank, Category},
    month::YearMonth,
    normalize::required_name,
    store::LedgerStore,
};

// Matching is case-insensitive substring on the Unicode-folded names.
const BANKS_BY_CATEGORY: &str = "SELECT DISTINCT b.id, b.name
     FROM bank_cashback_categories bcc
     JOIN banks b ON b.id = bcc.bank_id
     JOIN categories c ON c.id = bcc.category_id
     JOIN cashback_months cm ON cm.id = bcc.cashback_month_id
     WHERE cm.user_id = ?1 AND cm.month = ?2
       AND instr(casefold(c.name), casefold(?3)) > 0
     ORDER BY b.name";

const CATEGORIES_BY_BANK: &str = "SELECT DISTINCT c.id, c.name
     FROM bank_cashback_categories bcc
     JOIN banks b ON b.id = bcc.bank_id
     JOIN categories c ON c.id = bcc.category_id
     JOIN cashback_months cm ON cm.id = bcc.cashback_month_id
     WHERE cm.user_id = ?1 AND cm.month = ?2
       AND instr(casefold(b.name), casefold(?3)) > 0
     ORDER BY c.name";

impl LedgerStore {
    pub fn banks_offering_category(
        &self,
        user: UserId,
        month: YearMonth,
        query: &str,
    ) -> Result<Vec<Bank>> {
        let query = required_name(query, "category")?;
        let banks = self.lookup(user, month, &query, BANKS_BY_CATEGORY, |id, name| Bank { id, name })?;
        debug!(user_id = %user, month = %month, query = %query, found = banks.len(), "Banks by category");
        Ok(banks)
    }

    pub fn categories_of_bank(
        &self,
        user: UserId,
        month: YearMonth,
        query: &str,
    ) -> Result<Vec<Category>> {
        let query = required_name(query, "bank")?;
        let categories =
            self.lookup(user, month, &query, CATEGORIES_BY_BANK, |id, name| Category { id, name })?;
        debug!(user_id = %user, month = %month, query = %query, found = categories.len(), "Categories by bank");
        Ok(categories)
    }

    fn lookup<T>(
        &self,
        user: UserId,
        month: YearMonth,
        query: &str,
        sql: &str,
        build: impl Fn(i64, String) -> T,
    ) -> Result<Vec<T>> {
        self.read(|tx| {
            let mut stmt = tx.prepare_cached(sql)?;
            let rows = stmt.query_map(params![user.get(), month.storage_key(), query], |row| {
                Ok(build(row.get(0)?, row.get(1)?))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}
