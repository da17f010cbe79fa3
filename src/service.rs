use std::sync::Arc;

use tokio::task;
use tracing::warn;

use crate::{
    error::{LedgerError, Result},
    identity::UserId,
    models::{Bank, BankFacts, CashbackMonthView, Category, CategoryPercent},
    month::YearMonth,
    store::{LedgerStore, StoreStats},
    writer::{WritePolicy, WriteSummary},
};

#[derive(Debug, Clone)]
pub struct CashbackLedger {
    store: Arc<LedgerStore>,
}

impl CashbackLedger {
    pub fn new(store: LedgerStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub async fn replace_month(
        &self,
        user_id: i64,
        month: &str,
        banks: Vec<BankFacts>,
    ) -> Result<WriteSummary> {
        self.write_month(user_id, month, banks, WritePolicy::Replace)
            .await
    }

    pub async fn merge_month(
        &self,
        user_id: i64,
        month: &str,
        banks: Vec<BankFacts>,
    ) -> Result<WriteSummary> {
        self.write_month(user_id, month, banks, WritePolicy::Merge).await
    }

    async fn write_month(
        &self,
        user_id: i64,
        month: &str,
        banks: Vec<BankFacts>,
        policy: WritePolicy,
    ) -> Result<WriteSummary> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.write_month(user, month, &banks, policy))
            .await
    }

    pub async fn replace_bank_categories(
        &self,
        user_id: i64,
        month: &str,
        bank: String,
        categories: Vec<CategoryPercent>,
    ) -> Result<WriteSummary> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.replace_bank_categories(user, month, &bank, &categories))
            .await
    }

    pub async fn get_month(&self, user_id: i64, month: &str) -> Result<Option<CashbackMonthView>> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.get_month(user, month)).await
    }

    pub async fn remove_bank(&self, user_id: i64, month: &str, bank: String) -> Result<usize> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.remove_bank(user, month, &bank))
            .await
    }

    pub async fn remove_category(
        &self,
        user_id: i64,
        month: &str,
        bank: String,
        category: String,
    ) -> Result<()> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.remove_category(user, month, &bank, &category))
            .await
    }

    pub async fn banks_offering_category(
        &self,
        user_id: i64,
        month: &str,
        query: String,
    ) -> Result<Vec<Bank>> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.banks_offering_category(user, month, &query))
            .await
    }

    pub async fn categories_of_bank(
        &self,
        user_id: i64,
        month: &str,
        query: String,
    ) -> Result<Vec<Category>> {
        let (user, month) = scope(user_id, month)?;
        self.run(move |store| store.categories_of_bank(user, month, &query))
            .await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.run(|store| store.stats()).await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LedgerStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match task::spawn_blocking(move || op(store.as_ref())).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Ledger task join error: {err:#}");
                Err(LedgerError::Unavailable(format!("ledger task failed: {err}")))
            }
        }
    }
}

fn scope(user_id: i64, month: &str) -> Result<(UserId, YearMonth)> {
    Ok((UserId::new(user_id)?, YearMonth::parse(month)?))
}
