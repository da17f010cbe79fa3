pub(crate) const CURRENT_VERSION: i32 = 1;

pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS banks (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS cashback_months (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL CHECK (user_id > 0),
    month   TEXT NOT NULL,
    UNIQUE(user_id, month)
);

CREATE TABLE IF NOT EXISTS bank_cashback_categories (
    cashback_month_id INTEGER NOT NULL REFERENCES cashback_months(id) ON DELETE CASCADE,
    bank_id           INTEGER NOT NULL REFERENCES banks(id),
    category_id       INTEGER NOT NULL REFERENCES categories(id),
    percent           REAL NOT NULL CHECK (percent >= 0 AND percent <= 100),
    UNIQUE(cashback_month_id, bank_id, category_id)
);

CREATE INDEX IF NOT EXISTS idx_bcc_bank ON bank_cashback_categories(bank_id);
CREATE INDEX IF NOT EXISTS idx_bcc_category ON bank_cashback_categories(category_id);
"#;
