use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SiloError;
use crate::types::{SqlValue, ValueMap};

/// Column names shared by every row of one result, with a name lookup.
#[derive(Debug)]
pub(crate) struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: Vec<String>) -> Self {
        // First occurrence wins for duplicated names, matching positional lookup.
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }
}

/// A row from a query result.
///
/// Column names are shared across all rows produced by the same cursor.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a standalone row.
    #[must_use]
    pub fn new(column_names: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self::with_columns(Arc::new(Columns::new(column_names)), values)
    }

    pub(crate) fn with_columns(columns: Arc<Columns>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.columns.index.get(column_name).copied()
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Typed access to a column.
    ///
    /// # Errors
    /// Returns [`SiloError::DecodeError`] if the column is missing or its value
    /// does not convert to `T`.
    pub fn try_get<T: FromSqlValue>(&self, column_name: &str) -> Result<T, SiloError> {
        let value = self
            .get(column_name)
            .ok_or_else(|| SiloError::decode(column_name, "no such column"))?;
        T::from_sql_value(value)
            .ok_or_else(|| SiloError::decode(column_name, format!("unexpected value {value:?}")))
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn to_value_map(&self) -> ValueMap {
        self.iter()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }

    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names() && self.values == other.values
    }
}

/// Conversion out of a [`SqlValue`] for [`Row::try_get`].
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_blob().map(<[u8]>::to_vec)
    }
}

impl FromSqlValue for chrono::NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_timestamp()
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            vec!["id".into(), "name".into(), "note".into()],
            vec![SqlValue::Int(7), SqlValue::from("ann"), SqlValue::Null],
        )
    }

    #[test]
    fn lookup_by_name_and_index() {
        let row = sample();
        assert_eq!(row.get("name"), Some(&SqlValue::from("ann")));
        assert_eq!(row.get_by_index(0), Some(&SqlValue::Int(7)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn typed_access() {
        let row = sample();
        assert_eq!(row.try_get::<i64>("id").expect("id"), 7);
        assert_eq!(row.try_get::<Option<String>>("note").expect("note"), None);
        assert!(matches!(
            row.try_get::<i64>("name"),
            Err(SiloError::DecodeError { .. })
        ));
    }

    #[test]
    fn value_map_keeps_column_order() {
        let map = sample().to_value_map();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["id", "name", "note"]);
    }
}
