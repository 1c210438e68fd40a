use std::fmt::Display;

use crate::registry::DEFAULT_CONNECTION;
use crate::types::{SqlValue, ValueMap};

mod builder;
mod run;

pub use builder::StatementBuilder;

/// Sigil that marks a named placeholder inside a SQL fragment.
pub const PLACEHOLDER_SIGIL: char = ':';

/// One statement in progress.
///
/// Filled through [`StatementBuilder`] methods and consumed by exactly one
/// terminal operation (`run_select`, `run_insert`, ...). The state holds no
/// SQL knowledge beyond the raw fragments a caller supplies.
///
/// ```rust
/// use sql_silo::prelude::*;
///
/// let mut q = QueryState::new("users");
/// let min_age = q.param(18, None);
/// let q = q.where_(["age >=", min_age.as_str()]).order(["name"]).limit(10, None);
/// assert_eq!(q.where_clause.as_deref(), Some("age >= :p_0"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub table: String,
    /// Database/schema qualifier.
    pub db: Option<String>,
    /// Raw projection; `None` selects `*`.
    pub fields: Option<String>,
    pub where_clause: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Column assignments for INSERT and UPDATE.
    pub content: ValueMap,
    /// Bound values keyed by placeholder name (without the sigil).
    pub params: ValueMap,
    /// Symbolic connection the statement runs on.
    pub connection: String,
    diagnostics: Vec<String>,
}

impl QueryState {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            db: None,
            fields: None,
            where_clause: None,
            order: None,
            limit: None,
            offset: None,
            content: ValueMap::new(),
            params: ValueMap::new(),
            connection: DEFAULT_CONNECTION.to_string(),
            diagnostics: Vec::new(),
        }
    }

    /// Non-fatal misuse warnings recorded while building this statement.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Register a value and return its placeholder token.
    ///
    /// Without a key the value is stored under a generated `p_<n>` name that
    /// is not yet used by this state. A caller-supplied key replaces any value
    /// already registered under it.
    pub fn param(&mut self, value: impl Into<SqlValue>, key: Option<&str>) -> String {
        let key = match key {
            Some(key) => key.to_string(),
            None => self.next_key("p"),
        };
        let token = format!("{PLACEHOLDER_SIGIL}{key}");
        self.params.insert(key, value);
        token
    }

    /// Register a keyed batch of values, e.g. for `IN (...)`.
    ///
    /// Each value is stored under `<prefix>_<subkey>`; the default prefix is
    /// a fresh `p_<n>`. Returns the parenthesised, comma-joined tokens.
    pub fn params<K, V, I>(&mut self, values: I, key_prefix: Option<&str>) -> String
    where
        K: Display,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let prefix = match key_prefix {
            Some(prefix) => prefix.to_string(),
            None => self.next_prefix("p"),
        };
        let tokens: Vec<String> = values
            .into_iter()
            .map(|(subkey, value)| {
                let key = format!("{prefix}_{subkey}");
                self.params.insert(key.clone(), value);
                format!("{PLACEHOLDER_SIGIL}{key}")
            })
            .collect();
        wrap(&comma(tokens))
    }

    /// [`params`](Self::params) with positional sub-keys `0, 1, ...`.
    pub fn params_list<V, I>(&mut self, values: I) -> String
    where
        V: Into<SqlValue>,
        I: IntoIterator<Item = V>,
    {
        self.params(values.into_iter().enumerate(), None)
    }

    /// First `<prefix>_<n>` name, counting from the current param count,
    /// that is not registered yet.
    pub(crate) fn next_key(&self, prefix: &str) -> String {
        let mut n = self.params.len();
        loop {
            let key = format!("{prefix}_{n}");
            if !self.params.contains_key(&key) {
                return key;
            }
            n += 1;
        }
    }

    /// Like [`next_key`](Self::next_key) but also free as a batch prefix.
    fn next_prefix(&self, prefix: &str) -> String {
        let mut n = self.params.len();
        loop {
            let candidate = format!("{prefix}_{n}");
            let batch = format!("{candidate}_");
            if !self
                .params
                .keys()
                .any(|key| key == candidate || key.starts_with(&batch))
            {
                return candidate;
            }
            n += 1;
        }
    }

    pub(crate) fn assign_clause(&mut self, clause: Clause, sql: String) {
        let slot = match clause {
            Clause::Where => &mut self.where_clause,
            Clause::Order => &mut self.order,
        };
        if slot.is_some() {
            let message = format!("overriding {} clause", clause.name());
            tracing::warn!(table = %self.table, clause = clause.name(), "{message}");
            self.diagnostics.push(message);
        }
        *slot = Some(sql);
    }

    pub(crate) fn append_where(&mut self, sql: String) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => format!("{existing} AND {sql}"),
            None => sql,
        });
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Clause {
    Where,
    Order,
}

impl Clause {
    fn name(self) -> &'static str {
        match self {
            Clause::Where => "where",
            Clause::Order => "order",
        }
    }
}

/// Join values with `", "`.
pub fn comma<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(value.as_ref());
    }
    out
}

/// Parenthesise `inner`.
#[must_use]
pub fn wrap(inner: &str) -> String {
    format!("({inner})")
}

pub(crate) fn join_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for fragment in fragments {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(fragment.as_ref());
    }
    out
}
