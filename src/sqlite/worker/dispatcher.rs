use std::sync::mpsc::Receiver;

use rusqlite::types::Value;
use tracing::{debug, error};

use crate::error::SiloError;
use crate::sqlite::query::read_row;

use super::channel::{Command, CursorCommand, CursorRequest};

enum TxExit {
    Finished,
    Shutdown,
}

pub(crate) fn run_sqlite_worker(mut conn: rusqlite::Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::BeginTransaction { respond_to } => match conn.transaction() {
                Ok(tx) => {
                    let _ = respond_to.send(Ok(()));
                    // The transaction borrows the connection and stays on this
                    // thread; commands are served against it until it ends.
                    if let TxExit::Shutdown = run_tx_loop(tx, receiver) {
                        break;
                    }
                }
                Err(err) => {
                    let _ = respond_to.send(Err(err.into()));
                }
            },
            Command::CommitTx { respond_to } | Command::RollbackTx { respond_to } => {
                let _ = respond_to.send(Err(no_active_transaction()));
            }
            command => serve(&conn, command),
        }
    }
    debug!("sqlite worker stopped");
}

fn run_tx_loop(tx: rusqlite::Transaction<'_>, receiver: &Receiver<Command>) -> TxExit {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::CommitTx { respond_to } => {
                let _ = respond_to.send(tx.commit().map_err(SiloError::from));
                return TxExit::Finished;
            }
            Command::RollbackTx { respond_to } => {
                let _ = respond_to.send(tx.rollback().map_err(SiloError::from));
                return TxExit::Finished;
            }
            Command::BeginTransaction { respond_to } => {
                let _ = respond_to.send(Err(SiloError::TransactionError(
                    "SQLite transaction already in progress".into(),
                )));
            }
            Command::Shutdown => {
                debug!("sqlite worker shut down inside a transaction; rolling back");
                return TxExit::Shutdown;
            }
            command => serve(&tx, command),
        }
    }
    TxExit::Shutdown
}

/// Statement commands, valid both inside and outside a transaction.
fn serve(conn: &rusqlite::Connection, command: Command) {
    match command {
        Command::ExecuteBatch { query, respond_to } => {
            let _ = respond_to.send(conn.execute_batch(&query).map_err(SiloError::from));
        }
        Command::Execute {
            query,
            params,
            respond_to,
        } => {
            let _ = respond_to.send(execute(conn, &query, &params));
        }
        Command::OpenCursor(cursor) => serve_cursor(conn, cursor),
        Command::LastInsertId { respond_to } => {
            let _ = respond_to.send(Ok(conn.last_insert_rowid()));
        }
        Command::BeginTransaction { respond_to }
        | Command::CommitTx { respond_to }
        | Command::RollbackTx { respond_to } => {
            error!("transaction command routed to statement handler");
            let _ = respond_to.send(Err(no_active_transaction()));
        }
        Command::Shutdown => {}
    }
}

fn execute(conn: &rusqlite::Connection, query: &str, params: &[Value]) -> Result<usize, SiloError> {
    let mut stmt = conn.prepare(query)?;
    let param_refs = values_as_tosql(params);
    Ok(stmt.execute(&param_refs[..])?)
}

/// Keep one statement open and hand out its rows one request at a time.
fn serve_cursor(conn: &rusqlite::Connection, cursor: CursorCommand) {
    let CursorCommand {
        query,
        params,
        opened,
        requests,
        replies,
    } = cursor;

    let mut stmt = match conn.prepare(&query) {
        Ok(stmt) => stmt,
        Err(err) => {
            let _ = opened.send(Err(err.into()));
            return;
        }
    };
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = columns.len();
    let param_refs = values_as_tosql(&params);
    let mut rows = match stmt.query(&param_refs[..]) {
        Ok(rows) => rows,
        Err(err) => {
            let _ = opened.send(Err(err.into()));
            return;
        }
    };
    if opened.send(Ok(columns)).is_err() {
        return;
    }

    while let Ok(CursorRequest::Next) = requests.recv() {
        let reply = match rows.next() {
            Ok(Some(row)) => read_row(row, column_count).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err.into()),
        };
        let finished = !matches!(reply, Ok(Some(_)));
        if replies.send(reply).is_err() || finished {
            break;
        }
    }
    // Finalize before `replies` is dropped.
    drop(rows);
    drop(stmt);
    drop(replies);
}

fn values_as_tosql(values: &[Value]) -> Vec<&dyn rusqlite::ToSql> {
    values.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
}

fn no_active_transaction() -> SiloError {
    SiloError::TransactionError("No active SQLite transaction".into())
}
