//! Store configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                        | Default          |
//! |---------------------------------|------------------|
//! | `STOCKROOM_DB_PATH`             | `stockroom.db`   |
//! | `STOCKROOM_MAX_CONNECTIONS`     | `5`              |
//! | `STOCKROOM_LOW_STOCK_THRESHOLD` | `10`             |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use stockroom_core::DEFAULT_LOW_STOCK_THRESHOLD;

use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "STOCKROOM_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "STOCKROOM_MAX_CONNECTIONS";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOCKROOM_LOW_STOCK_THRESHOLD";

/// Runtime configuration of the stock store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Products below this quantity are reported as low stock
    pub low_stock_threshold: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 5,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StoreConfig::default();

        let config = StoreConfig {
            database_path: lookup(ENV_DB_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: match lookup(ENV_MAX_CONNECTIONS) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()))?,
                None => defaults.max_connections,
            },

            low_stock_threshold: match lookup(ENV_LOW_STOCK_THRESHOLD) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_LOW_STOCK_THRESHOLD.to_string()))?,
                None => defaults.low_stock_threshold,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }

        if config.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue(ENV_LOW_STOCK_THRESHOLD.to_string()));
        }

        Ok(config)
    }

    /// Pool configuration for this store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .min_connections(1)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/stockroom/shop.db"),
            (ENV_MAX_CONNECTIONS, "8"),
            (ENV_LOW_STOCK_THRESHOLD, " 3 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/stockroom/shop.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.db_config().max_connections, 8);
    }

    #[test]
    fn test_invalid_values() {
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "many")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_LOW_STOCK_THRESHOLD, "-1")])).is_err());
    }
}
