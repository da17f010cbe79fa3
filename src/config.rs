use std::{env, path::PathBuf, time::Duration};

use anyhow::Result;

pub const DEFAULT_DB_PATH: &str = "data/cashback.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LOG_FILTER: &str = "cashback_ledger=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub busy_timeout: Duration,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = lookup("CASHBACK_DB_PATH")
            .map(|v| unquote(&v))
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let busy_timeout_ms = lookup("CASHBACK_BUSY_TIMEOUT_MS")
            .and_then(|v| unquote(&v).parse::<u64>().ok())
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);

        let log_filter = lookup("CASHBACK_LOG_FILTER")
            .map(|v| unquote(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            database_path,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            log_filter,
        }
    }
}

fn unquote(raw: &str) -> String {
    raw.trim().trim_matches('"').trim_matches('\'').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.busy_timeout, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn values_are_trimmed_and_unquoted() {
        let config = config_from(&[
            ("CASHBACK_DB_PATH", " \"/var/lib/cashback/ledger.db\" "),
            ("CASHBACK_BUSY_TIMEOUT_MS", "'250'"),
            ("CASHBACK_LOG_FILTER", "cashback_ledger=debug"),
        ]);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/cashback/ledger.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_filter, "cashback_ledger=debug");
    }

    #[test]
    fn unparsable_timeout_falls_back() {
        let config = config_from(&[("CASHBACK_BUSY_TIMEOUT_MS", "soon")]);
        assert_eq!(config.busy_timeout, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    }
}
