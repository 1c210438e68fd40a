use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::driver::Driver;
use crate::error::SiloError;

use super::connection::SqliteConnection;

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOptions {
    /// File path, or `:memory:`.
    pub path: String,
    /// How long to wait on a locked database before failing.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    #[serde(default = "enabled")]
    pub foreign_keys: bool,
    /// Switch file databases to WAL journaling.
    #[serde(default)]
    pub wal: bool,
}

fn enabled() -> bool {
    true
}

impl SqliteOptions {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: None,
            foreign_keys: true,
            wal: false,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Open the database and start its worker.
    ///
    /// # Errors
    /// Returns [`SiloError::ConnectionError`] if the file cannot be opened or
    /// a connection pragma fails.
    pub fn connect(&self) -> Result<SqliteConnection, SiloError> {
        let conn = rusqlite::Connection::open(&self.path).map_err(|err| {
            SiloError::ConnectionError(format!("failed to open SQLite database `{}`: {err}", self.path))
        })?;
        self.configure(&conn).map_err(|err| {
            SiloError::ConnectionError(format!("failed to configure SQLite database `{}`: {err}", self.path))
        })?;
        debug!(path = %self.path, wal = self.wal, "sqlite connection opened");
        SqliteConnection::new(conn, &self.path)
    }

    fn configure(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
        if let Some(ms) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        if self.wal && self.path != ":memory:" {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!(path = %self.path, journal_mode = %mode, "journal mode set");
        }
        Ok(())
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open the database and wrap it in a [`Driver`].
    ///
    /// # Errors
    /// Same as [`SqliteOptions::connect`].
    pub fn build(self) -> Result<Driver, SiloError> {
        Ok(Driver::new(self.finish().connect()?))
    }
}

impl Driver {
    #[must_use]
    pub fn sqlite_builder(path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(path)
    }
}

/// Driver over a private in-memory database.
///
/// # Errors
/// Returns [`SiloError::ConnectionError`] if the worker cannot start.
pub fn open_in_memory() -> Result<Driver, SiloError> {
    SqliteOptionsBuilder::new(":memory:").build()
}
