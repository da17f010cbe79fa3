use std::collections::HashMap;

use rusqlite::params;
use tracing::debug;

use crate::{
    error::Result,
    identity::UserId,
    models::{Bank, BankWithCategories, CashbackCategory, CashbackMonthView, Category},
    month::YearMonth,
    store::{find_month_id, LedgerStore},
};

struct FactRow {
    bank_id: i64,
    bank_name: String,
    category_id: i64,
    category_name: String,
    percent: f64,
}

impl LedgerStore {
    /// Nested view of a user's month, or `None` when the month was never written.
    pub fn get_month(&self, user: UserId, month: YearMonth) -> Result<Option<CashbackMonthView>> {
        let rows = self.read(|tx| {
            let Some(month_id) = find_month_id(tx, user, month)? else {
                return Ok(None);
            };

            let mut stmt = tx.prepare_cached(
                "SELECT b.id, b.name, c.id, c.name, bcc.percent
                 FROM bank_cashback_categories bcc
                 JOIN banks b ON b.id = bcc.bank_id
                 JOIN categories c ON c.id = bcc.category_id
                 WHERE bcc.cashback_month_id = ?1
                 ORDER BY b.name, c.name",
            )?;
            let rows = stmt.query_map(params![month_id], |row| {
                Ok(FactRow {
                    bank_id: row.get(0)?,
                    bank_name: row.get(1)?,
                    category_id: row.get(2)?,
                    category_name: row.get(3)?,
                    percent: row.get(4)?,
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(Some(out))
        })?;

        let Some(rows) = rows else {
            debug!(user_id = %user, month = %month, "Cashback month not found");
            return Ok(None);
        };

        let banks = group_by_bank(rows);
        debug!(user_id = %user, month = %month, banks = banks.len(), "Cashback month loaded");
        Ok(Some(CashbackMonthView {
            month,
            user_id: user,
            banks,
        }))
    }
}

fn group_by_bank(rows: Vec<FactRow>) -> Vec<BankWithCategories> {
    let mut position: HashMap<i64, usize> = HashMap::new();
    let mut banks: Vec<BankWithCategories> = Vec::new();

    for row in rows {
        let idx = *position.entry(row.bank_id).or_insert_with(|| {
            banks.push(BankWithCategories {
                bank: Bank {
                    id: row.bank_id,
                    name: row.bank_name.clone(),
                },
                categories: Vec::new(),
            });
            banks.len() - 1
        });
        banks[idx].categories.push(CashbackCategory {
            category: Category {
                id: row.category_id,
                name: row.category_name,
            },
            percent: row.percent,
        });
    }

    banks.retain(|b| !b.categories.is_empty());
    banks
}
