//! `AppConfig` from environment variables (after `dotenvy` has populated them).

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/crud_starter";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// Upper bound for a batch operation's transaction.
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub batch_timeout: Duration,
    pub body_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: DEFAULT_DATABASE_URL.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            batch_timeout: Duration::from_secs(DEFAULT_BATCH_TIMEOUT_SECS),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl AppConfig {
    /// Read `DATABASE_URL`, `BIND_ADDR`, `DB_MAX_CONNECTIONS`, `BATCH_TIMEOUT_SECS`, `BODY_LIMIT_BYTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let batch_secs = parse_or(&lookup, "BATCH_TIMEOUT_SECS", DEFAULT_BATCH_TIMEOUT_SECS)?;
        if batch_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BATCH_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(AppConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            batch_timeout: Duration::from_secs(batch_secs),
            body_limit: parse_or(&lookup, "BODY_LIMIT_BYTES", defaults.body_limit)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let c = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(c.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(c.max_connections, 5);
        assert_eq!(c.batch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides() {
        let c = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DB_MAX_CONNECTIONS", " 12 "),
            ("BATCH_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(c.database_url, "sqlite::memory:");
        assert_eq!(c.max_connections, 12);
        assert_eq!(c.batch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_garbage() {
        let err = AppConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        assert!(AppConfig::from_lookup(lookup(&[("BATCH_TIMEOUT_SECS", "0")])).is_err());
    }
}
