use crate::error::SiloError;
use crate::registry::ConnectionRegistry;
use crate::results::{Row, RowCursor};
use crate::types::SqlValue;

use super::QueryState;

/// Terminal operations: resolve the state's connection and hand the state
/// to its driver.
impl QueryState {
    /// # Errors
    /// [`SiloError::ConfigError`] for an unregistered connection, otherwise
    /// see [`Driver::select`](crate::Driver::select).
    pub fn run_select(self, registry: &mut ConnectionRegistry) -> Result<RowCursor<'_>, SiloError> {
        registry.get_connection(&self)?.select(self)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_select_first(self, registry: &mut ConnectionRegistry) -> Result<Option<Row>, SiloError> {
        registry.get_connection(&self)?.select_first(self)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_count(self, registry: &mut ConnectionRegistry) -> Result<i64, SiloError> {
        registry.get_connection(&self)?.count(self)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_delete(self, registry: &mut ConnectionRegistry) -> Result<usize, SiloError> {
        registry.get_connection(&self)?.delete(self)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_update(self, registry: &mut ConnectionRegistry) -> Result<usize, SiloError> {
        registry.get_connection(&self)?.update(self)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_insert(
        self,
        registry: &mut ConnectionRegistry,
        pk: &[&str],
    ) -> Result<Option<SqlValue>, SiloError> {
        registry.get_connection(&self)?.insert(self, pk)
    }
}
