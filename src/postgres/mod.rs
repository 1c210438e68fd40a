// PostgreSQL backend.
//
// - config: connection options and validation
// - connection: blocking `Connection` over tokio-postgres
// - params: SqlValue -> Postgres parameter encoding
// - query: Postgres row -> SqlValue extraction

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{PostgresOptions, PostgresOptionsBuilder};
pub use connection::PostgresConnection;
