pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod models;
pub mod month;
pub mod normalize;
pub mod pruner;
pub mod reader;
pub mod service;
pub mod store;
pub mod writer;

pub use catalog::{CatalogEntry, CatalogKind};
pub use config::Config;
pub use error::{LedgerError, Result};
pub use identity::UserId;
pub use models::{
    Bank, BankFacts, BankWithCategories, CashbackCategory, CashbackMonthView, Category,
    CategoryPercent,
};
pub use month::YearMonth;
pub use service::CashbackLedger;
pub use store::{LedgerStore, StoreStats};
pub use writer::{WritePolicy, WriteSummary};
