//! Row-oriented layer over [`QueryState`] and the driver: locate rows by
//! primary key, save and remove models, and iterate hydrated results.

use std::iter::FusedIterator;

use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::query_builder::{QueryState, StatementBuilder, comma, wrap};
use crate::registry::ConnectionRegistry;
use crate::results::{Row, RowCursor};
use crate::types::SqlValue;

mod model;

pub use model::{Entity, LocateTarget, Model, identity};

/// Maps a raw row to a domain value.
pub type Hydrator<M> = fn(Row) -> Result<M, SiloError>;

/// Query state bound to a table, its primary key, a registry and a hydrator.
pub struct Schema<'r, M> {
    state: QueryState,
    registry: &'r mut ConnectionRegistry,
    primary_key: &'static [&'static str],
    hydrator: Hydrator<M>,
}

impl<'r> Schema<'r, Row> {
    /// Schema over `table` that yields raw rows.
    #[must_use]
    pub fn rows(
        registry: &'r mut ConnectionRegistry,
        table: &str,
        primary_key: &'static [&'static str],
    ) -> Self {
        Schema::new(registry, table, primary_key, identity)
    }
}

impl<'r, M> Schema<'r, M> {
    #[must_use]
    pub fn new(
        registry: &'r mut ConnectionRegistry,
        table: &str,
        primary_key: &'static [&'static str],
        hydrator: Hydrator<M>,
    ) -> Self {
        Self {
            state: QueryState::new(table),
            registry,
            primary_key,
            hydrator,
        }
    }

    /// Schema declared by an [`Entity`] implementation.
    #[must_use]
    pub fn for_entity(registry: &'r mut ConnectionRegistry) -> Self
    where
        M: Entity,
    {
        let mut schema = Schema::new(registry, M::TABLE, M::PRIMARY_KEY, M::hydrate);
        schema.state.db = M::DB.map(str::to_string);
        schema.state.connection = M::CONNECTION.to_string();
        schema
    }

    #[must_use]
    pub fn primary_key(&self) -> &'static [&'static str] {
        self.primary_key
    }

    #[must_use]
    pub fn into_state(self) -> QueryState {
        self.state
    }

    /// Add one `<quoted pk> = :p_n` condition per primary-key column.
    ///
    /// # Errors
    /// [`SiloError::ConfigError`] if the schema has no primary key, the
    /// connection is not registered, or `target` lacks a key value.
    pub fn locate<'a>(mut self, target: impl Into<LocateTarget<'a>>) -> Result<Self, SiloError> {
        let primary_key = self.require_primary_key()?;
        let dialect = self.dialect()?;
        let values = target.into().key_values(primary_key)?;
        for (field, value) in primary_key.iter().zip(values) {
            let token = self.state.param(value, None);
            self = self.and_where([dialect.quote(field).as_str(), "=", token.as_str()]);
        }
        Ok(self)
    }

    /// Match any of `targets` in one condition:
    /// `(pk, ...) IN ((:a, ...), (:b, ...))`. No targets matches nothing.
    ///
    /// # Errors
    /// Same as [`locate`](Self::locate).
    pub fn locate_multi<'a, I, T>(mut self, targets: I) -> Result<Self, SiloError>
    where
        I: IntoIterator<Item = T>,
        T: Into<LocateTarget<'a>>,
    {
        let primary_key = self.require_primary_key()?;
        let dialect = self.dialect()?;
        let mut tuples = Vec::new();
        for target in targets {
            let values = target.into().key_values(primary_key)?;
            let tokens: Vec<String> = values
                .into_iter()
                .map(|value| self.state.param(value, None))
                .collect();
            tuples.push(wrap(&comma(tokens)));
        }
        if tuples.is_empty() {
            return Ok(self.and_where(["1=0"]));
        }
        let keys = wrap(&comma(primary_key.iter().map(|field| dialect.quote(field))));
        let list = wrap(&comma(tuples));
        Ok(self.and_where([keys.as_str(), "IN", list.as_str()]))
    }

    /// Update an existing row with its changed columns, or insert a new one.
    ///
    /// Returns the affected-row count: `0` without touching the database
    /// when an existing model reports no changes, `1` after an insert. The
    /// generated key of an insert is passed to [`Model::on_inserted`].
    ///
    /// # Errors
    /// Propagates locate and execution errors.
    pub fn save<T: Model>(self, model: &mut T) -> Result<usize, SiloError> {
        if model.is_row_exists() {
            let changes = model.row_data_for_update();
            if changes.is_empty() {
                return Ok(0);
            }
            return self
                .locate(LocateTarget::Model(&*model))?
                .content(changes)
                .run_update();
        }
        let key = self.content(model.row_data()).run_insert()?;
        model.on_inserted(key);
        Ok(1)
    }

    /// Delete the model's row, bounded to one row.
    ///
    /// # Errors
    /// Propagates locate and execution errors.
    pub fn remove<T: Model>(self, model: &T) -> Result<usize, SiloError> {
        self.locate(LocateTarget::Model(model))?
            .limit(1, None)
            .run_delete()
    }

    /// Lazily hydrate every matching row.
    ///
    /// # Errors
    /// Returns execution errors raised when the statement starts; errors
    /// while reading rows or hydrating come from the iterator.
    pub fn find(self) -> Result<Find<'r, M>, SiloError> {
        let hydrator = self.hydrator;
        let cursor = self.run_select()?;
        Ok(Find { cursor, hydrator })
    }

    /// First hydrated row, reading at most one row.
    ///
    /// # Errors
    /// Same as [`find`](Self::find), plus the error of that first row.
    pub fn find_first(self) -> Result<Option<M>, SiloError> {
        self.limit(1, None).find()?.next().transpose()
    }

    /// # Errors
    /// [`SiloError::ConfigError`] for an unregistered connection, otherwise
    /// the driver's error.
    pub fn run_select(self) -> Result<RowCursor<'r>, SiloError> {
        let Schema {
            state, registry, ..
        } = self;
        registry.get_connection(&state)?.select(state)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_select_first(self) -> Result<Option<Row>, SiloError> {
        let Schema {
            state, registry, ..
        } = self;
        state.run_select_first(registry)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_count(self) -> Result<i64, SiloError> {
        let Schema {
            state, registry, ..
        } = self;
        state.run_count(registry)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_delete(self) -> Result<usize, SiloError> {
        let Schema {
            state, registry, ..
        } = self;
        state.run_delete(registry)
    }

    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_update(self) -> Result<usize, SiloError> {
        let Schema {
            state, registry, ..
        } = self;
        state.run_update(registry)
    }

    /// Insert using the schema's primary key for the returned key.
    ///
    /// # Errors
    /// See [`run_select`](Self::run_select).
    pub fn run_insert(self) -> Result<Option<SqlValue>, SiloError> {
        let Schema {
            state,
            registry,
            primary_key,
            ..
        } = self;
        state.run_insert(registry, primary_key)
    }

    fn dialect(&self) -> Result<Dialect, SiloError> {
        self.registry.dialect(&self.state.connection).ok_or_else(|| {
            SiloError::ConfigError(format!(
                "connection `{}` is not registered",
                self.state.connection
            ))
        })
    }

    fn require_primary_key(&self) -> Result<&'static [&'static str], SiloError> {
        if self.primary_key.is_empty() {
            return Err(SiloError::ConfigError(format!(
                "table `{}` declares no primary key",
                self.state.table
            )));
        }
        Ok(self.primary_key)
    }
}

impl<M> StatementBuilder for Schema<'_, M> {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }
}

impl<M> std::fmt::Debug for Schema<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("state", &self.state)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

/// Lazy sequence of hydrated rows.
pub struct Find<'c, M> {
    cursor: RowCursor<'c>,
    hydrator: Hydrator<M>,
}

impl<M> Iterator for Find<'_, M> {
    type Item = Result<M, SiloError>;

    fn next(&mut self) -> Option<Self::Item> {
        let hydrator = self.hydrator;
        self.cursor.next().map(|row| row.and_then(hydrator))
    }
}

impl<M> FusedIterator for Find<'_, M> {}
