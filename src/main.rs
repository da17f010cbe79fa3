use anyhow::{Context, Result};
use cashback_ledger::{CashbackLedger, Config, LedgerStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    let store = LedgerStore::open(&config.database_path, config.busy_timeout).with_context(|| {
        format!(
            "Failed to open ledger database at {}",
            config.database_path.display()
        )
    })?;
    let ledger = CashbackLedger::new(store);

    let stats = ledger.stats().await.context("Failed to read ledger stats")?;
    info!(
        path = %config.database_path.display(),
        schema_version = stats.schema_version,
        banks = stats.banks,
        categories = stats.categories,
        months = stats.months,
        facts = stats.facts,
        "Cashback ledger schema ready"
    );
    Ok(())
}
