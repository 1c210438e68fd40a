use rusqlite::types::Value;

use crate::error::SiloError;
use crate::types::SqlValue;

/// Extract a [`SqlValue`] from a `SQLite` row.
///
/// # Errors
///
/// Returns [`SiloError::ExecutionError`] if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, SiloError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

pub(crate) fn read_row(row: &rusqlite::Row<'_>, column_count: usize) -> Result<Vec<SqlValue>, SiloError> {
    (0..column_count)
        .map(|idx| sqlite_extract_value(row, idx))
        .collect()
}
