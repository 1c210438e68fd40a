use tracing::{debug, warn};

use crate::connection::{BoundParam, Connection};
use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::query_builder::{QueryState, comma, wrap};
use crate::results::{Row, RowCursor};
use crate::translation::translate_named;
use crate::types::{SqlValue, ValueMap};

pub(crate) mod statement;
mod transaction;

/// Dialect-aware executor over one live connection.
///
/// Turns a [`QueryState`] into SQL for its dialect, binds the parameters
/// and normalises the outcome into a row cursor, an affected-row count or a
/// generated key. The driver owns its connection; concurrent callers need
/// separate drivers.
pub struct Driver {
    connection: Box<dyn Connection>,
    dialect: Dialect,
    current_database: Option<String>,
    last_params: ValueMap,
    in_transaction: bool,
}

impl Driver {
    #[must_use]
    pub fn new(connection: impl Connection + 'static) -> Self {
        Self::from_boxed(Box::new(connection))
    }

    #[must_use]
    pub fn from_boxed(connection: Box<dyn Connection>) -> Self {
        let dialect = connection.dialect();
        Self {
            connection,
            dialect,
            current_database: None,
            last_params: ValueMap::new(),
            in_transaction: false,
        }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Quote an identifier for this driver's dialect.
    #[must_use]
    pub fn quote(&self, ident: &str) -> String {
        self.dialect.quote(ident)
    }

    #[must_use]
    pub fn comma<I, S>(&self, values: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        comma(values)
    }

    #[must_use]
    pub fn wrap(&self, inner: &str) -> String {
        wrap(inner)
    }

    /// Copy of the parameters bound by the last statement, including values
    /// the backend wrote into `o_` parameters.
    #[must_use]
    pub fn output_params(&self) -> &ValueMap {
        &self.last_params
    }

    /// Run a SELECT and return its rows lazily.
    ///
    /// # Errors
    /// Returns [`SiloError::CrossDatabase`] on a database mismatch,
    /// [`SiloError::ParameterError`] for an unbound placeholder, or the
    /// backend's [`SiloError::ExecutionError`].
    pub fn select(&mut self, q: QueryState) -> Result<RowCursor<'_>, SiloError> {
        let table = self.qualified_table(&q)?;
        let sql = statement::select_sql(self.dialect, &table, &q);
        self.query(&sql, &q.params)
    }

    /// First row of [`select`](Self::select); the statement is released
    /// without reading further rows.
    ///
    /// # Errors
    /// Same as [`select`](Self::select).
    pub fn select_first(&mut self, q: QueryState) -> Result<Option<Row>, SiloError> {
        self.select(q)?.first_row()
    }

    /// `SELECT COUNT(*)` over the state's WHERE clause.
    ///
    /// # Errors
    /// Same as [`select`](Self::select), plus [`SiloError::DecodeError`] if
    /// the backend returns no integer count.
    pub fn count(&mut self, q: QueryState) -> Result<i64, SiloError> {
        let table = self.qualified_table(&q)?;
        let sql = statement::count_sql(&table, &q);
        let row = self.query(&sql, &q.params)?.first_row()?;
        let value = row.as_ref().and_then(|row| row.get_by_index(0));
        match value {
            Some(SqlValue::Int(n)) => Ok(*n),
            Some(SqlValue::Text(s)) => s
                .parse()
                .map_err(|_| SiloError::decode("COUNT(*)", format!("not an integer: {s}"))),
            other => Err(SiloError::decode("COUNT(*)", format!("unexpected value {other:?}"))),
        }
    }

    /// # Errors
    /// [`SiloError::ParameterError`] for an offset on a dialect that limits
    /// mutations in place; otherwise as [`select`](Self::select).
    pub fn delete(&mut self, q: QueryState) -> Result<usize, SiloError> {
        let table = self.qualified_table(&q)?;
        let sql = statement::delete_sql(self.dialect, &table, &q)?;
        self.execute(&sql, &q.params)
    }

    /// Assign the state's content to the matching rows.
    ///
    /// # Errors
    /// [`SiloError::ParameterError`] if the content is empty or carries an
    /// offset the dialect cannot apply; otherwise as [`select`](Self::select).
    pub fn update(&mut self, mut q: QueryState) -> Result<usize, SiloError> {
        let table = self.qualified_table(&q)?;
        let sql = statement::update_sql(self.dialect, &table, &mut q)?;
        self.execute(&sql, &q.params)
    }

    /// Insert the state's content and return the generated key.
    ///
    /// Dialects with `RETURNING` read the key of a single-column `pk` from
    /// the returned row; a composite key yields `None`. Other dialects
    /// return the session's last generated identity.
    ///
    /// # Errors
    /// Same as [`select`](Self::select).
    pub fn insert(&mut self, mut q: QueryState, pk: &[&str]) -> Result<Option<SqlValue>, SiloError> {
        let table = self.qualified_table(&q)?;
        if self.dialect.supports_returning() && !pk.is_empty() {
            let sql = statement::insert_sql(self.dialect, &table, &mut q, pk);
            let row = self.query(&sql, &q.params)?.first_row()?;
            if pk.len() > 1 {
                warn!(table = %q.table, key = ?pk, "composite key is not returned from insert");
                return Ok(None);
            }
            return Ok(row.and_then(|row| row.into_values().into_iter().next()));
        }
        let sql = statement::insert_sql(self.dialect, &table, &mut q, &[]);
        self.execute(&sql, &q.params)?;
        self.connection.last_insert_id()
    }

    /// Run a statement written with `:name` placeholders and return its rows.
    ///
    /// # Errors
    /// [`SiloError::ParameterError`] for a placeholder missing from `params`,
    /// or the backend's error.
    pub fn query(&mut self, sql: &str, params: &ValueMap) -> Result<RowCursor<'_>, SiloError> {
        let (native, bound) = self.bind(sql, params)?;
        debug!(dialect = ?self.dialect, sql = %native, params = bound.len(), "query");
        let mut source = self.connection.query(&native, &bound)?;
        // The source borrows the connection, so its outputs come from the source.
        let mut captured = params.clone();
        captured.extend(source.output_values());
        self.last_params = captured;
        Ok(RowCursor::new(source))
    }

    /// Run a statement written with `:name` placeholders and return the
    /// affected-row count.
    ///
    /// # Errors
    /// Same as [`query`](Self::query).
    pub fn execute(&mut self, sql: &str, params: &ValueMap) -> Result<usize, SiloError> {
        let (native, bound) = self.bind(sql, params)?;
        debug!(dialect = ?self.dialect, sql = %native, params = bound.len(), "execute");
        let affected = self.connection.execute(&native, &bound)?;
        self.capture_params(params);
        Ok(affected)
    }

    /// Run raw SQL, possibly several statements, without parameters.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), SiloError> {
        debug!(dialect = ?self.dialect, "execute batch");
        self.connection.execute_batch(sql)
    }

    /// Rewrite placeholders for the backend and order the values to match.
    fn bind(&self, sql: &str, params: &ValueMap) -> Result<(String, Vec<BoundParam>), SiloError> {
        let translated = translate_named(sql, self.dialect);
        let bound = translated
            .names
            .into_iter()
            .map(|name| match params.get(&name) {
                Some(value) => Ok(BoundParam::new(name, value.clone())),
                None => Err(SiloError::ParameterError(format!(
                    "no value bound for placeholder :{name}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((translated.sql.into_owned(), bound))
    }

    fn capture_params(&mut self, params: &ValueMap) {
        let mut captured = params.clone();
        captured.extend(self.connection.output_values());
        self.last_params = captured;
    }

    /// `db.table`, or the bare table after checking `db` against the
    /// session database on dialects that cannot qualify across databases.
    fn qualified_table(&mut self, q: &QueryState) -> Result<String, SiloError> {
        let Some(db) = q.db.as_deref().filter(|db| !db.is_empty()) else {
            return Ok(q.table.clone());
        };
        let Some(lookup) = self.dialect.current_database_query() else {
            return Ok(format!("{db}.{}", q.table));
        };
        let actual = match &self.current_database {
            Some(name) => name.clone(),
            None => {
                let name = self.fetch_current_database(lookup)?;
                self.current_database = Some(name.clone());
                name
            }
        };
        if actual != db {
            return Err(SiloError::CrossDatabase {
                declared: db.to_string(),
                actual,
            });
        }
        Ok(q.table.clone())
    }

    fn fetch_current_database(&mut self, sql: &str) -> Result<String, SiloError> {
        debug!(dialect = ?self.dialect, sql, "current database lookup");
        let mut rows = self.connection.query(sql, &[])?;
        let first = rows.next_row().transpose()?;
        first
            .and_then(|values| values.into_iter().next())
            .and_then(|value| value.as_text().map(str::to_string))
            .ok_or_else(|| SiloError::ConnectionError("session reported no current database".into()))
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("dialect", &self.dialect)
            .field("current_database", &self.current_database)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}
