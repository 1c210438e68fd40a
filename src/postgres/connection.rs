use std::pin::Pin;

use futures_util::StreamExt;
use tokio::runtime::Runtime;
use tokio_postgres::{Client, NoTls, RowStream};
use tracing::{debug, error};

use crate::connection::{BoundParam, Connection};
use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::results::RowSource;
use crate::types::SqlValue;

use super::params::as_refs;
use super::query::read_row;

/// Blocking PostgreSQL session.
///
/// Owns a single-threaded runtime that drives the `tokio_postgres` client
/// and its connection task; every call blocks on that runtime.
pub struct PostgresConnection {
    runtime: Runtime,
    client: Client,
}

impl PostgresConnection {
    /// # Errors
    /// Returns [`SiloError::ConnectionError`] if the runtime cannot start or
    /// the server refuses the connection.
    pub fn connect(config: &tokio_postgres::Config) -> Result<Self, SiloError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SiloError::ConnectionError(format!("Failed to start Postgres runtime: {e}")))?;
        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| SiloError::ConnectionError(format!("Failed to connect to Postgres: {e}")))?;
        runtime.spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "postgres connection closed with error");
            }
        });
        debug!(dbname = ?config.get_dbname(), "postgres connection opened");
        Ok(Self { runtime, client })
    }

    fn batch(&mut self, sql: &str) -> Result<(), SiloError> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }
}

impl Connection for PostgresConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&mut self, sql: &str, params: &[BoundParam]) -> Result<Box<dyn RowSource + '_>, SiloError> {
        let refs = as_refs(params);
        let stmt = self.runtime.block_on(self.client.prepare(sql))?;
        let columns = stmt
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let stream = self
            .runtime
            .block_on(self.client.query_raw(&stmt, refs.iter().copied()))?;
        Ok(Box::new(PostgresRows {
            runtime: &self.runtime,
            columns,
            stream: Box::pin(stream),
        }))
    }

    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<usize, SiloError> {
        let refs = as_refs(params);
        let rows = self.runtime.block_on(self.client.execute(sql, &refs))?;
        usize::try_from(rows).map_err(|e| {
            SiloError::execution("client", format!("postgres affected rows conversion error: {e}"))
        })
    }

    /// Inserts read their key through `RETURNING`; there is no session
    /// identity to report.
    fn last_insert_id(&mut self) -> Result<Option<SqlValue>, SiloError> {
        Ok(None)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SiloError> {
        self.batch(sql)
    }

    fn begin(&mut self) -> Result<(), SiloError> {
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), SiloError> {
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SiloError> {
        self.batch("ROLLBACK")
    }
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

struct PostgresRows<'c> {
    runtime: &'c Runtime,
    columns: Vec<String>,
    stream: Pin<Box<RowStream>>,
}

impl RowSource for PostgresRows<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>> {
        let row = self.runtime.block_on(self.stream.next())?;
        Some(row.map_err(SiloError::from).and_then(|row| read_row(&row)))
    }
}
