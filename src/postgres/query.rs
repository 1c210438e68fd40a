use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::SiloError;
use crate::types::SqlValue;

/// Extracts a [`SqlValue`] from a `tokio_postgres` row at the given index.
///
/// # Errors
/// Returns [`SiloError::ExecutionError`] if the column cannot be read as the
/// Rust type its Postgres type maps to.
pub fn postgres_extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<SqlValue, SiloError> {
    let type_name = row.columns()[idx].type_().name();

    Ok(match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v)))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v)))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Int)
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v)))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Float)
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Bool)
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        "timestamptz" => {
            let val: Option<DateTime<Utc>> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, |v| SqlValue::Timestamp(v.naive_utc()))
        }
        "date" => {
            let val: Option<NaiveDate> = row.try_get(idx)?;
            val.and_then(|d| d.and_hms_opt(0, 0, 0))
                .map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Json)
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Blob)
        }
        // Text types, and anything else that decodes as a string.
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            val.map_or(SqlValue::Null, SqlValue::Text)
        }
    })
}

pub(crate) fn read_row(row: &tokio_postgres::Row) -> Result<Vec<SqlValue>, SiloError> {
    (0..row.columns().len())
        .map(|idx| postgres_extract_value(row, idx))
        .collect()
}
