use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::translation::PlaceholderStyle;

/// SQL dialect family a driver speaks.
///
/// Selected once when a driver is constructed; every dialect difference the
/// statement assembly cares about is answered by a method here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `SQLite`: `[ident]`, `?N` placeholders, `last_insert_rowid()`.
    Sqlite,
    /// `PostgreSQL`: `"ident"`, `$N` placeholders, `RETURNING`.
    #[value(alias = "pgsql")]
    #[serde(alias = "pgsql")]
    Postgres,
    /// `MySQL` / `MariaDB`: `` `ident` ``, positional `?`, `LAST_INSERT_ID()`.
    #[value(alias = "mariadb")]
    #[serde(alias = "mariadb")]
    Mysql,
    /// Anything else: identifiers unquoted, `:name` placeholders left as written.
    Generic,
}

impl Dialect {
    /// Map a backend driver name (`sqlite`, `pgsql`, `mysql`, ...) to a dialect.
    #[must_use]
    pub fn from_driver_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            "pgsql" | "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::Mysql,
            _ => Dialect::Generic,
        }
    }

    /// Quote an identifier.
    #[must_use]
    pub fn quote(self, ident: &str) -> String {
        match self {
            Dialect::Sqlite => format!("[{ident}]"),
            Dialect::Postgres => format!("\"{ident}\""),
            Dialect::Mysql => format!("`{ident}`"),
            Dialect::Generic => ident.to_string(),
        }
    }

    #[must_use]
    pub fn placeholder_style(self) -> PlaceholderStyle {
        match self {
            Dialect::Sqlite => PlaceholderStyle::Numbered,
            Dialect::Postgres => PlaceholderStyle::Dollar,
            Dialect::Mysql => PlaceholderStyle::Positional,
            Dialect::Generic => PlaceholderStyle::Named,
        }
    }

    /// Render the LIMIT clause body, or `None` when no limit is set.
    #[must_use]
    pub fn limit_clause(self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        let limit = limit?;
        Some(match (self, offset) {
            (_, None) => format!("LIMIT {limit}"),
            (Dialect::Postgres, Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (_, Some(offset)) => format!("LIMIT {offset}, {limit}"),
        })
    }

    /// Whether inserts read generated keys from a `RETURNING` clause.
    #[must_use]
    pub fn supports_returning(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Hidden row identity used to apply ORDER BY / LIMIT to DELETE and
    /// UPDATE on engines that reject those clauses there.
    #[must_use]
    pub fn row_identity(self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some("rowid"),
            Dialect::Postgres => Some("ctid"),
            Dialect::Mysql | Dialect::Generic => None,
        }
    }

    /// Tail of an INSERT that supplies no columns.
    #[must_use]
    pub fn empty_insert_tail(self) -> &'static str {
        match self {
            Dialect::Mysql => "() VALUES ()",
            _ => "DEFAULT VALUES",
        }
    }

    /// Query returning the session's current database name, for dialects
    /// that assert `db` rather than qualify with it.
    #[must_use]
    pub fn current_database_query(self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => Some("SELECT current_database()"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_per_family() {
        assert_eq!(Dialect::Sqlite.quote("id"), "[id]");
        assert_eq!(Dialect::Postgres.quote("id"), "\"id\"");
        assert_eq!(Dialect::Mysql.quote("id"), "`id`");
        assert_eq!(Dialect::Generic.quote("id"), "id");
    }

    #[test]
    fn limit_without_offset_has_no_offset_term() {
        for dialect in [Dialect::Sqlite, Dialect::Postgres, Dialect::Mysql] {
            assert_eq!(dialect.limit_clause(Some(5), None).as_deref(), Some("LIMIT 5"));
        }
        assert_eq!(Dialect::Sqlite.limit_clause(None, Some(3)), None);
    }

    #[test]
    fn offset_goes_first_in_comma_syntax() {
        assert_eq!(
            Dialect::Mysql.limit_clause(Some(10), Some(20)).as_deref(),
            Some("LIMIT 20, 10")
        );
        assert_eq!(
            Dialect::Postgres.limit_clause(Some(10), Some(20)).as_deref(),
            Some("LIMIT 10 OFFSET 20")
        );
    }

    #[test]
    fn driver_names() {
        assert_eq!(Dialect::from_driver_name("pgsql"), Dialect::Postgres);
        assert_eq!(Dialect::from_driver_name("SQLite"), Dialect::Sqlite);
        assert_eq!(Dialect::from_driver_name("oci"), Dialect::Generic);
    }

    #[test]
    fn deserializes_lowercase_names() {
        let dialect: Dialect = serde_json::from_str("\"pgsql\"").expect("alias");
        assert_eq!(dialect, Dialect::Postgres);
        let dialect: Dialect = serde_json::from_str("\"mysql\"").expect("name");
        assert_eq!(dialect, Dialect::Mysql);
    }
}
