use crate::error::SiloError;
use crate::registry::{ConnectionRegistry, DEFAULT_CONNECTION};
use crate::results::Row;
use crate::types::{SqlValue, ValueMap};

use super::Schema;

/// Row-level view of a domain object, as the schema layer needs it.
pub trait Model {
    /// Full column data, primary key included.
    fn row_data(&self) -> ValueMap;

    /// Columns that changed since the row was loaded. An empty map makes
    /// [`Schema::save`] a no-op.
    fn row_data_for_update(&self) -> ValueMap {
        self.row_data()
    }

    /// Whether the row is already stored.
    fn is_row_exists(&self) -> bool;

    /// Receives the generated key after an insert.
    fn on_inserted(&mut self, key: Option<SqlValue>) {
        let _ = key;
    }
}

/// Entity type bound to one table.
///
/// ```rust
/// use sql_silo::prelude::*;
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Entity for User {
///     const TABLE: &'static str = "users";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn hydrate(row: Row) -> Result<Self, SiloError> {
///         Ok(User {
///             id: row.try_get("id")?,
///             name: row.try_get("name")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    const TABLE: &'static str;
    const DB: Option<&'static str> = None;
    const PRIMARY_KEY: &'static [&'static str] = &[];
    const CONNECTION: &'static str = DEFAULT_CONNECTION;

    /// Map a raw row to the entity.
    ///
    /// # Errors
    /// Returns [`SiloError::DecodeError`] when a column is missing or has the
    /// wrong type.
    fn hydrate(row: Row) -> Result<Self, SiloError>;

    /// Start a query against this entity's table.
    fn query(registry: &mut ConnectionRegistry) -> Schema<'_, Self> {
        Schema::for_entity(registry)
    }
}

/// Hydrator that returns rows unchanged.
///
/// # Errors
/// Never fails.
pub fn identity(row: Row) -> Result<Row, SiloError> {
    Ok(row)
}

/// What [`Schema::locate`] reads primary-key values from.
#[derive(Clone, Copy)]
pub enum LocateTarget<'a> {
    Model(&'a dyn Model),
    Data(&'a ValueMap),
    Row(&'a Row),
}

impl LocateTarget<'_> {
    pub(crate) fn key_values(&self, primary_key: &[&str]) -> Result<Vec<SqlValue>, SiloError> {
        let owned;
        let data: Option<&ValueMap> = match self {
            LocateTarget::Model(model) => {
                owned = model.row_data();
                Some(&owned)
            }
            LocateTarget::Data(map) => Some(*map),
            LocateTarget::Row(_) => None,
        };
        primary_key
            .iter()
            .map(|field| {
                let value = match (data, self) {
                    (Some(map), _) => map.get(field),
                    (None, LocateTarget::Row(row)) => row.get(field),
                    (None, _) => None,
                };
                value.cloned().ok_or_else(|| {
                    SiloError::ConfigError(format!(
                        "locate target has no value for primary key `{field}`"
                    ))
                })
            })
            .collect()
    }
}

impl<'a> From<&'a ValueMap> for LocateTarget<'a> {
    fn from(map: &'a ValueMap) -> Self {
        LocateTarget::Data(map)
    }
}

impl<'a> From<&'a Row> for LocateTarget<'a> {
    fn from(row: &'a Row) -> Self {
        LocateTarget::Row(row)
    }
}

impl<'a> From<&'a dyn Model> for LocateTarget<'a> {
    fn from(model: &'a dyn Model) -> Self {
        LocateTarget::Model(model)
    }
}

impl std::fmt::Debug for LocateTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateTarget::Model(model) => f.debug_tuple("Model").field(&model.row_data()).finish(),
            LocateTarget::Data(map) => f.debug_tuple("Data").field(map).finish(),
            LocateTarget::Row(row) => f.debug_tuple("Row").field(row).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair;

    impl Model for Pair {
        fn row_data(&self) -> ValueMap {
            ValueMap::from([("a", 1), ("b", 2)])
        }

        fn is_row_exists(&self) -> bool {
            true
        }
    }

    #[test]
    fn key_values_follow_primary_key_order() {
        let target = LocateTarget::Model(&Pair);
        assert_eq!(
            target.key_values(&["b", "a"]).expect("keys"),
            vec![SqlValue::Int(2), SqlValue::Int(1)]
        );
    }

    #[test]
    fn rows_and_maps_are_targets() {
        let row = Row::new(vec!["id".into()], vec![SqlValue::Int(4)]);
        assert_eq!(
            LocateTarget::from(&row).key_values(&["id"]).expect("keys"),
            vec![SqlValue::Int(4)]
        );
        let map = ValueMap::from([("other", 1)]);
        assert!(matches!(
            LocateTarget::from(&map).key_values(&["id"]),
            Err(SiloError::ConfigError(_))
        ));
    }
}
