use std::sync::mpsc::{self, Receiver, Sender};

use crate::connection::{BoundParam, Connection};
use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::results::RowSource;
use crate::types::SqlValue;

use super::params::convert_params;
use super::worker::{Command, CursorCommand, CursorRequest, SqliteWorker};

/// `SQLite` session backed by a dedicated worker thread.
///
/// Dropping the connection stops the worker; an open transaction is rolled
/// back.
#[derive(Debug)]
pub struct SqliteConnection {
    worker: SqliteWorker,
}

impl SqliteConnection {
    /// Hand an open `rusqlite` connection to a new worker thread.
    ///
    /// # Errors
    /// Returns [`SiloError::ConnectionError`] if the thread cannot be spawned.
    pub fn new(conn: rusqlite::Connection, label: &str) -> Result<Self, SiloError> {
        Ok(Self {
            worker: SqliteWorker::spawn(conn, label)?,
        })
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str, params: &[BoundParam]) -> Result<Box<dyn RowSource + '_>, SiloError> {
        let (opened_tx, opened_rx) = mpsc::channel();
        let (requests_tx, requests_rx) = mpsc::channel();
        let (replies_tx, replies_rx) = mpsc::channel();
        self.worker.send_command(Command::OpenCursor(CursorCommand {
            query: sql.to_string(),
            params: convert_params(params),
            opened: opened_tx,
            requests: requests_rx,
            replies: replies_tx,
        }))?;
        let columns = opened_rx.recv().map_err(|_| {
            SiloError::ConnectionError("SQLite worker dropped while opening cursor".into())
        })??;
        Ok(Box::new(SqliteRows {
            columns,
            requests: requests_tx,
            replies: replies_rx,
            exhausted: false,
        }))
    }

    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<usize, SiloError> {
        let params = convert_params(params);
        self.worker.request("executing statement", |respond_to| Command::Execute {
            query: sql.to_string(),
            params,
            respond_to,
        })
    }

    fn last_insert_id(&mut self) -> Result<Option<SqlValue>, SiloError> {
        let rowid = self
            .worker
            .request("reading last insert id", |respond_to| Command::LastInsertId { respond_to })?;
        Ok(Some(SqlValue::Int(rowid)))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SiloError> {
        self.worker.request("executing batch", |respond_to| Command::ExecuteBatch {
            query: sql.to_string(),
            respond_to,
        })
    }

    fn begin(&mut self) -> Result<(), SiloError> {
        self.worker
            .request("starting transaction", |respond_to| Command::BeginTransaction { respond_to })
    }

    fn commit(&mut self) -> Result<(), SiloError> {
        self.worker
            .request("committing", |respond_to| Command::CommitTx { respond_to })
    }

    fn rollback(&mut self) -> Result<(), SiloError> {
        self.worker
            .request("rolling back", |respond_to| Command::RollbackTx { respond_to })
    }
}

/// Client end of a statement held open by the worker.
struct SqliteRows {
    columns: Vec<String>,
    requests: Sender<CursorRequest>,
    replies: Receiver<Result<Option<Vec<SqlValue>>, SiloError>>,
    exhausted: bool,
}

impl RowSource for SqliteRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>> {
        if self.exhausted {
            return None;
        }
        let reply = match self.requests.send(CursorRequest::Next) {
            Ok(()) => self.replies.recv().ok(),
            Err(_) => None,
        };
        match reply {
            Some(Ok(Some(values))) => Some(Ok(values)),
            Some(Ok(None)) => {
                self.exhausted = true;
                None
            }
            Some(Err(err)) => {
                self.exhausted = true;
                Some(Err(err))
            }
            None => {
                self.exhausted = true;
                Some(Err(SiloError::ConnectionError(
                    "SQLite worker dropped while reading rows".into(),
                )))
            }
        }
    }
}

impl Drop for SqliteRows {
    fn drop(&mut self) {
        let _ = self.requests.send(CursorRequest::Close);
        // The worker drops its reply sender only after finalizing the
        // statement; wait for that before the connection is used again.
        while self.replies.recv().is_ok() {}
    }
}
