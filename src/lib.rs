//! Portable query building and blocking execution over SQLite, PostgreSQL
//! and MySQL-family backends.
//!
//! Build a [`QueryState`] fluently, then run it through a
//! [`ConnectionRegistry`]. The driver behind the state's connection renders
//! the statement for its dialect, binds the `:name` parameters and returns a
//! lazy row cursor, an affected-row count or a generated key.
//!
//! ```rust
//! use sql_silo::prelude::*;
//!
//! let mut registry = ConnectionRegistry::with_default(open_in_memory()?);
//! registry
//!     .driver(DEFAULT_CONNECTION)?
//!     .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER);")?;
//!
//! let id = QueryState::new("users")
//!     .set("name", "ada")
//!     .set("age", 36)
//!     .run_insert(&mut registry, &["id"])?;
//! assert_eq!(id, Some(SqlValue::Int(1)));
//!
//! let row = QueryState::new("users")
//!     .gte("age", 18)
//!     .order(["name"])
//!     .run_select_first(&mut registry)?
//!     .expect("one adult");
//! assert_eq!(row.try_get::<String>("name")?, "ada");
//! # Ok::<(), SiloError>(())
//! ```

pub mod connection;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod exports;
pub mod prelude;
pub mod query_builder;
pub mod registry;
pub mod results;
pub mod schema;
pub mod translation;
pub mod types;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod config;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use connection::{BoundParam, Connection, ParamDirection};
pub use dialect::Dialect;
pub use driver::Driver;
pub use error::SiloError;
pub use query_builder::{QueryState, StatementBuilder};
pub use registry::{ConnectionRegistry, DEFAULT_CONNECTION};
pub use results::{Row, RowCursor};
pub use schema::{Entity, Model, Schema};
pub use types::{SqlValue, ValueMap};
