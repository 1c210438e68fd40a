//! Backend-specific exports.
//!
//! Feature-gated re-exports for each backend, kept in one place so the
//! prelude can pull them in without repeating the gates.

// SQLite exports
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteOptions;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteOptionsBuilder;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::open_in_memory;

// PostgreSQL exports
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnection;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresOptions;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresOptionsBuilder;

// Configuration
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use crate::config::ConnectionConfig;
