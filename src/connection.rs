use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::results::RowSource;
use crate::types::{SqlValue, ValueMap};

/// Placeholder names carrying this prefix bind as in/out parameters.
pub const OUTPUT_PARAM_PREFIX: &str = "o_";

/// How a parameter is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    In,
    /// In/out parameter with a value buffer of [`OUTPUT_PARAM_SIZE`] bytes.
    InOut,
}

/// Buffer size reserved for in/out parameters on backends that support them.
pub const OUTPUT_PARAM_SIZE: usize = 255;

/// One parameter, in the order the backend statement expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    /// Placeholder name without the leading `:`.
    pub name: String,
    pub value: SqlValue,
    pub direction: ParamDirection,
}

impl BoundParam {
    #[must_use]
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        let name = name.into();
        let direction = if name.starts_with(OUTPUT_PARAM_PREFIX) {
            ParamDirection::InOut
        } else {
            ParamDirection::In
        };
        Self {
            name,
            value,
            direction,
        }
    }
}

/// A live backend session.
///
/// Statements arrive already rewritten into the backend's placeholder style,
/// with parameters in binding order. A connection is owned by exactly one
/// [`Driver`](crate::Driver) and is never used from two callers at once.
pub trait Connection: Send {
    fn dialect(&self) -> Dialect;

    /// Run a statement and return its rows lazily.
    ///
    /// # Errors
    /// Returns [`SiloError::ExecutionError`] if the backend rejects the statement.
    fn query(&mut self, sql: &str, params: &[BoundParam]) -> Result<Box<dyn RowSource + '_>, SiloError>;

    /// Run a statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns [`SiloError::ExecutionError`] if the backend rejects the statement.
    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<usize, SiloError>;

    /// Session-scoped identity generated by the last insert.
    ///
    /// # Errors
    /// Returns an error if the backend cannot report the value.
    fn last_insert_id(&mut self) -> Result<Option<SqlValue>, SiloError>;

    /// Run raw SQL, possibly several statements, without parameters.
    ///
    /// # Errors
    /// Returns [`SiloError::ExecutionError`] if any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), SiloError>;

    /// # Errors
    /// Returns an error if a transaction is already open or the backend refuses.
    fn begin(&mut self) -> Result<(), SiloError>;

    /// # Errors
    /// Returns an error if no transaction is open or the commit fails.
    fn commit(&mut self) -> Result<(), SiloError>;

    /// # Errors
    /// Returns an error if no transaction is open or the rollback fails.
    fn rollback(&mut self) -> Result<(), SiloError>;

    /// Values written back into in/out parameters by the last `execute`.
    /// Queries report theirs through [`RowSource::output_values`].
    fn output_values(&mut self) -> ValueMap {
        ValueMap::new()
    }
}
