use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::SiloError;
use crate::query_builder::QueryState;

/// Connection name used when a query does not pick one.
pub const DEFAULT_CONNECTION: &str = "default";

/// Named drivers, resolved per query by the query's connection name.
///
/// An explicit context object: the caller builds it at startup, passes it to
/// terminal operations, and decides when drivers are torn down.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    drivers: HashMap<String, Driver>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a single driver under [`DEFAULT_CONNECTION`].
    #[must_use]
    pub fn with_default(driver: Driver) -> Self {
        let mut registry = Self::new();
        registry.set_connection(DEFAULT_CONNECTION, driver);
        registry
    }

    /// Register `driver` under `name`, returning the driver it replaces.
    pub fn set_connection(&mut self, name: impl Into<String>, driver: Driver) -> Option<Driver> {
        let name = name.into();
        tracing::debug!(connection = %name, dialect = ?driver.dialect(), "registering connection");
        self.drivers.insert(name, driver)
    }

    /// Driver for the connection `q` declares.
    ///
    /// # Errors
    /// Returns [`SiloError::ConfigError`] if no driver is registered under
    /// that name.
    pub fn get_connection(&mut self, q: &QueryState) -> Result<&mut Driver, SiloError> {
        self.driver(&q.connection)
    }

    /// # Errors
    /// Returns [`SiloError::ConfigError`] if `name` is not registered.
    pub fn driver(&mut self, name: &str) -> Result<&mut Driver, SiloError> {
        self.drivers
            .get_mut(name)
            .ok_or_else(|| SiloError::ConfigError(format!("connection `{name}` is not registered")))
    }

    #[must_use]
    pub fn dialect(&self, name: &str) -> Option<Dialect> {
        self.drivers.get(name).map(Driver::dialect)
    }

    /// Remove and return a driver; dropping it closes its connection.
    pub fn take_connection(&mut self, name: &str) -> Option<Driver> {
        self.drivers.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }
}
