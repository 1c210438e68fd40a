//! Convenient imports for common functionality.
//!
//! This module re-exports the types and traits most programs need to build
//! and run queries.

pub use crate::connection::{BoundParam, Connection, ParamDirection};
pub use crate::dialect::Dialect;
pub use crate::driver::Driver;
pub use crate::error::SiloError;
pub use crate::query_builder::{QueryState, StatementBuilder, comma, wrap};
pub use crate::registry::{ConnectionRegistry, DEFAULT_CONNECTION};
pub use crate::results::{FromSqlValue, MemoryRows, Row, RowCursor, RowSource};
pub use crate::schema::{Entity, Find, LocateTarget, Model, Schema, identity};
pub use crate::translation::{PlaceholderStyle, translate_named};
pub use crate::types::{SqlValue, ValueMap};

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use crate::exports::ConnectionConfig;

#[cfg(feature = "postgres")]
pub use crate::exports::{PostgresConnection, PostgresOptions, PostgresOptionsBuilder};

#[cfg(feature = "sqlite")]
pub use crate::exports::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder, open_in_memory};
