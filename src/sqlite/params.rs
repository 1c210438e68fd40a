use rusqlite::types::Value;

use crate::connection::BoundParam;
use crate::types::SqlValue;

/// Storage format for timestamps; SQLite has no native datetime type.
pub const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Convert a single [`SqlValue`] to a rusqlite `Value`.
#[must_use]
pub fn sql_value_to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        SqlValue::Null => Value::Null,
        SqlValue::Json(jval) => Value::Text(jval.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Values in binding order. `?N` placeholders are numbered by first
/// appearance, so the order of the bound list is the binding order.
#[must_use]
pub fn convert_params(params: &[BoundParam]) -> Vec<Value> {
    params
        .iter()
        .map(|param| sql_value_to_sqlite(&param.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn timestamps_and_bools_use_sqlite_storage_classes() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("valid date");
        assert_eq!(
            sql_value_to_sqlite(&SqlValue::Timestamp(dt)),
            Value::Text("2024-05-01 08:30:00".into())
        );
        assert_eq!(sql_value_to_sqlite(&SqlValue::Bool(true)), Value::Integer(1));
        assert_eq!(
            sql_value_to_sqlite(&SqlValue::Json(serde_json::json!({"a": 1}))),
            Value::Text(r#"{"a":1}"#.into())
        );
    }
}
