// SQLite backend.
//
// - config: options, builder and connection setup
// - connection: the `Connection` implementation and its row cursor
// - params: SqlValue -> rusqlite value conversion
// - query: rusqlite row -> SqlValue extraction
// - worker: thread that owns the rusqlite connection

pub mod config;
pub mod connection;
pub mod params;
pub mod query;
mod worker;

pub use config::{SqliteOptions, SqliteOptionsBuilder, open_in_memory};
pub use connection::SqliteConnection;
