use std::fmt::Display;

use crate::types::{SqlValue, ValueMap};

use super::{Clause, QueryState, join_fragments};

/// Fluent mutators shared by [`QueryState`] and the schema layer.
///
/// Fragment-taking methods join their fragments with a single space, so
/// `and_where(["age", ">", token])` reads like the SQL it produces.
pub trait StatementBuilder: Sized {
    fn state(&self) -> &QueryState;

    fn state_mut(&mut self) -> &mut QueryState;

    /// Set the WHERE clause. Replacing an existing clause is recorded as a
    /// diagnostic and logged, not rejected.
    #[must_use]
    fn where_<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut()
            .assign_clause(Clause::Where, join_fragments(fragments));
        self
    }

    /// Append to the WHERE clause with `AND`, creating it if absent.
    #[must_use]
    fn and_where<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut().append_where(join_fragments(fragments));
        self
    }

    /// Set the ORDER BY clause; same overwrite rule as [`where_`](Self::where_).
    #[must_use]
    fn order<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut()
            .assign_clause(Clause::Order, join_fragments(fragments));
        self
    }

    /// Bound the result to `limit` rows starting at `offset`.
    #[must_use]
    fn limit(mut self, limit: u64, offset: impl Into<Option<u64>>) -> Self {
        let state = self.state_mut();
        state.limit = Some(limit);
        state.offset = offset.into();
        self
    }

    /// Raw SELECT projection.
    #[must_use]
    fn fields(mut self, fields: impl Into<String>) -> Self {
        self.state_mut().fields = Some(fields.into());
        self
    }

    /// Replace the write content.
    #[must_use]
    fn content(mut self, content: ValueMap) -> Self {
        self.state_mut().content = content;
        self
    }

    /// Assign one column of the write content.
    #[must_use]
    fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.state_mut().content.insert(field, value);
        self
    }

    #[must_use]
    fn in_db(mut self, db: impl Into<String>) -> Self {
        self.state_mut().db = Some(db.into());
        self
    }

    /// Run on the named registry connection instead of the default one.
    #[must_use]
    fn on_connection(mut self, name: impl Into<String>) -> Self {
        self.state_mut().connection = name.into();
        self
    }

    /// Register a caller-named parameter without taking its token.
    #[must_use]
    fn bind(mut self, key: &str, value: impl Into<SqlValue>) -> Self {
        let _ = self.state_mut().param(value, Some(key));
        self
    }

    /// See [`QueryState::param`].
    fn param(&mut self, value: impl Into<SqlValue>, key: Option<&str>) -> String {
        self.state_mut().param(value, key)
    }

    /// See [`QueryState::params`].
    fn params<K, V, I>(&mut self, values: I, key_prefix: Option<&str>) -> String
    where
        K: Display,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.state_mut().params(values, key_prefix)
    }

    /// See [`QueryState::params_list`].
    fn params_list<V, I>(&mut self, values: I) -> String
    where
        V: Into<SqlValue>,
        I: IntoIterator<Item = V>,
    {
        self.state_mut().params_list(values)
    }

    /// `field = value`
    #[must_use]
    fn eq(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, "=", value)
    }

    /// `field <> value`
    #[must_use]
    fn neq(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, "<>", value)
    }

    #[must_use]
    fn gt(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, ">", value)
    }

    #[must_use]
    fn lt(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, "<", value)
    }

    #[must_use]
    fn gte(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, ">=", value)
    }

    #[must_use]
    fn lte(self, field: &str, value: impl Into<SqlValue>) -> Self {
        self.where_field_op(field, "<=", value)
    }

    /// `field IN (...)`; an empty list matches nothing (`1=0`).
    #[must_use]
    fn is_in<V, I>(mut self, field: &str, values: I) -> Self
    where
        V: Into<SqlValue>,
        I: IntoIterator<Item = V>,
    {
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.and_where(["1=0"]);
        }
        let tokens = self.state_mut().params_list(values);
        self.and_where([field, "IN", tokens.as_str()])
    }

    #[must_use]
    fn where_field_op(mut self, field: &str, op: &str, value: impl Into<SqlValue>) -> Self {
        let token = self.state_mut().param(value, None);
        self.and_where([field, op, token.as_str()])
    }
}

impl StatementBuilder for QueryState {
    fn state(&self) -> &QueryState {
        self
    }

    fn state_mut(&mut self) -> &mut QueryState {
        self
    }
}
