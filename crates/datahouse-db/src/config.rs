//! Database configuration loaded from environment variables.
//!
//! | Variable                            | Default        |
//! |-------------------------------------|----------------|
//! | `DATAHOUSE_DB_PATH`                 | `datahouse.db` |
//! | `DATAHOUSE_DB_MAX_CONNECTIONS`      | `5`            |
//! | `DATAHOUSE_DB_BUSY_TIMEOUT_MS`      | `5000`         |
//! | `DATAHOUSE_DB_CONNECT_TIMEOUT_SECS` | `30`           |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::pool::DbConfig;

pub const DB_PATH_VAR: &str = "DATAHOUSE_DB_PATH";
pub const MAX_CONNECTIONS_VAR: &str = "DATAHOUSE_DB_MAX_CONNECTIONS";
pub const BUSY_TIMEOUT_VAR: &str = "DATAHOUSE_DB_BUSY_TIMEOUT_MS";
pub const CONNECT_TIMEOUT_VAR: &str = "DATAHOUSE_DB_CONNECT_TIMEOUT_SECS";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

impl DbConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(DB_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "datahouse.db".to_string());

        let max_connections: u32 = parse_or(&lookup, MAX_CONNECTIONS_VAR, 5)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(MAX_CONNECTIONS_VAR.to_string()));
        }

        let busy_timeout_ms: u64 = parse_or(&lookup, BUSY_TIMEOUT_VAR, 5000)?;
        let connect_timeout_secs: u64 = parse_or(&lookup, CONNECT_TIMEOUT_VAR, 30)?;

        Ok(DbConfig::new(path)
            .max_connections(max_connections)
            .busy_timeout(Duration::from_millis(busy_timeout_ms))
            .connect_timeout(Duration::from_secs(connect_timeout_secs)))
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}
