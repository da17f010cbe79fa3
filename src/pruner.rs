use rusqlite::params;
use tracing::{debug, info, warn};

use crate::{
    error::{LedgerError, Result},
    identity::UserId,
    month::YearMonth,
    normalize::required_name,
    store::LedgerStore,
};

impl LedgerStore {
    /// Drops every fact of `bank` in the month. Removing nothing is not an
    /// error; the caller gets `0` back.
    pub fn remove_bank(&self, user: UserId, month: YearMonth, bank: &str) -> Result<usize> {
        let bank = required_name(bank, "bank")?;
        let removed = self.write(|tx| {
            Ok(tx.execute(
                "DELETE FROM bank_cashback_categories
                 WHERE cashback_month_id = (
                     SELECT id FROM cashback_months WHERE user_id = ?1 AND month = ?2
                 )
                 AND bank_id = (SELECT id FROM banks WHERE name = ?3)",
                params![user.get(), month.storage_key(), bank],
            )?)
        })?;

        if removed == 0 {
            debug!(user_id = %user, month = %month, bank = %bank, "No facts to remove for bank");
        } else {
            info!(user_id = %user, month = %month, bank = %bank, removed, "Bank removed from month");
        }
        Ok(removed)
    }

    /// Drops exactly one `(bank, category)` fact. Unlike [`Self::remove_bank`],
    /// a miss is reported as `NotFound`.
    pub fn remove_category(
        &self,
        user: UserId,
        month: YearMonth,
        bank: &str,
        category: &str,
    ) -> Result<()> {
        let bank = required_name(bank, "bank")?;
        let category = required_name(category, "category")?;
        let removed = self.write(|tx| {
            Ok(tx.execute(
                "DELETE FROM bank_cashback_categories
                 WHERE cashback_month_id = (
                     SELECT id FROM cashback_months WHERE user_id = ?1 AND month = ?2
                 )
                 AND bank_id = (SELECT id FROM banks WHERE name = ?3)
                 AND category_id = (SELECT id FROM categories WHERE name = ?4)",
                params![user.get(), month.storage_key(), bank, category],
            )?)
        })?;

        if removed == 0 {
            warn!(user_id = %user, month = %month, bank = %bank, category = %category, "Category not found for bank");
            return Err(LedgerError::not_found(format!(
                "category {category:?} not found for bank {bank:?} in {month}"
            )));
        }

        info!(user_id = %user, month = %month, bank = %bank, category = %category, "Category removed from bank");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::CatalogKind, models::BankFacts};

    fn seeded() -> (LedgerStore, UserId, YearMonth) {
        let store = LedgerStore::open_in_memory().expect("store");
        let user = UserId::new(42).expect("user");
        let month = YearMonth::parse("2024-05").expect("month");
        store
            .replace_month(
                user,
                month,
                &[
                    BankFacts::new("Sber", [("Taxi", 10.0), ("Cafe", 3.0)]),
                    BankFacts::new("Tinkoff", [("Taxi", 5.0)]),
                ],
            )
            .expect("seed");
        (store, user, month)
    }

    fn bank_names(store: &LedgerStore, user: UserId, month: YearMonth) -> Vec<String> {
        store
            .get_month(user, month)
            .expect("read")
            .expect("present")
            .banks
            .into_iter()
            .map(|b| b.bank.name)
            .collect()
    }

    #[test]
    fn remove_bank_is_lenient() {
        let (store, user, month) = seeded();
        assert_eq!(store.remove_bank(user, month, "Sber").expect("remove"), 2);
        assert_eq!(bank_names(&store, user, month), vec!["Tinkoff"]);

        assert_eq!(store.remove_bank(user, month, "Sber").expect("again"), 0);
        assert_eq!(store.remove_bank(user, month, "Unknown").expect("unknown"), 0);
        let empty_month = YearMonth::parse("1999-01").expect("month");
        assert_eq!(store.remove_bank(user, empty_month, "Sber").expect("no month"), 0);
    }

    #[test]
    fn remove_bank_keeps_catalog_entry() {
        let (store, user, month) = seeded();
        store.remove_bank(user, month, "Tinkoff").expect("remove");
        assert!(store
            .find_catalog(CatalogKind::Bank, "Tinkoff")
            .expect("find")
            .is_some());
    }

    #[test]
    fn remove_bank_only_touches_that_user() {
        let (store, user, month) = seeded();
        let other = UserId::new(43).expect("user");
        store
            .replace_month(other, month, &[BankFacts::new("Sber", [("Taxi", 1.0)])])
            .expect("other");
        store.remove_bank(user, month, "Sber").expect("remove");
        assert_eq!(bank_names(&store, other, month), vec!["Sber"]);
    }

    #[test]
    fn remove_category_is_strict() {
        let (store, user, month) = seeded();
        store
            .remove_category(user, month, "Sber", "Taxi")
            .expect("remove");

        let err = store
            .remove_category(user, month, "Sber", "Taxi")
            .expect_err("already gone");
        assert_eq!(err.code(), "NOT_FOUND");

        let err = store
            .remove_category(user, month, "Tinkoff", "Cafe")
            .expect_err("wrong bank");
        assert_eq!(err.code(), "NOT_FOUND");

        let view = store.get_month(user, month).expect("read").expect("present");
        assert_eq!(view.fact_count(), 2);
    }

    #[test]
    fn names_are_normalized_before_matching() {
        let (store, user, month) = seeded();
        store
            .remove_category(user, month, "\u{a0}Sber ", " Cafe")
            .expect("remove");
        assert_eq!(store.remove_bank(user, month, "Tinkoff\u{a0}").expect("remove"), 1);
        assert!(store.remove_bank(user, month, "  ").is_err());
    }
}
