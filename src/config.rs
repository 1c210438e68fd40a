//! Connection settings that can be loaded from configuration files.
//!
//! ```rust
//! use sql_silo::prelude::*;
//!
//! let registry = ConnectionRegistry::from_json(
//!     r#"{ "default": { "dialect": "sqlite", "path": ":memory:" } }"#,
//! )?;
//! assert!(registry.contains(DEFAULT_CONNECTION));
//! # Ok::<(), SiloError>(())
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::SiloError;
use crate::registry::ConnectionRegistry;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresOptions;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteOptions;

/// Settings for one named connection, tagged by dialect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "dialect", rename_all = "lowercase")]
pub enum ConnectionConfig {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "postgres")]
    #[serde(alias = "pgsql")]
    Postgres(PostgresOptions),
}

impl ConnectionConfig {
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(_) => Dialect::Sqlite,
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Open the connection and wrap it in a [`Driver`].
    ///
    /// # Errors
    /// Returns [`SiloError::ConfigError`] for invalid settings or
    /// [`SiloError::ConnectionError`] if the backend cannot be reached.
    pub fn connect(&self) -> Result<Driver, SiloError> {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(opts) => Ok(Driver::new(opts.connect()?)),
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(opts) => Ok(Driver::new(opts.connect()?)),
        }
    }
}

impl ConnectionRegistry {
    /// Connect every configured connection and register it under its name.
    ///
    /// # Errors
    /// Returns the first connection failure, wrapped with the connection's name.
    pub fn from_configs<I, K>(configs: I) -> Result<Self, SiloError>
    where
        I: IntoIterator<Item = (K, ConnectionConfig)>,
        K: Into<String>,
    {
        let mut registry = ConnectionRegistry::new();
        for (name, config) in configs {
            let name = name.into();
            let driver = config.connect().map_err(|err| match err {
                SiloError::ConfigError(msg) => SiloError::ConfigError(format!("{name}: {msg}")),
                SiloError::ConnectionError(msg) => {
                    SiloError::ConnectionError(format!("{name}: {msg}"))
                }
                other => other,
            })?;
            registry.set_connection(name, driver);
        }
        Ok(registry)
    }

    /// [`from_configs`](Self::from_configs) over a JSON object of name to settings.
    ///
    /// # Errors
    /// Returns [`SiloError::ConfigError`] if the JSON does not describe
    /// connections, otherwise as [`from_configs`](Self::from_configs).
    pub fn from_json(json: &str) -> Result<Self, SiloError> {
        let configs: BTreeMap<String, ConnectionConfig> = serde_json::from_str(json)
            .map_err(|e| SiloError::ConfigError(format!("invalid connection config: {e}")))?;
        Self::from_configs(configs)
    }
}
