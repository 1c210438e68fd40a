use std::sync::mpsc::{Receiver, Sender};

use rusqlite::types::Value;

use crate::error::SiloError;
use crate::types::SqlValue;

pub(crate) type Reply<T> = Sender<Result<T, SiloError>>;

pub(crate) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: Reply<()>,
    },
    Execute {
        query: String,
        params: Vec<Value>,
        respond_to: Reply<usize>,
    },
    OpenCursor(CursorCommand),
    LastInsertId {
        respond_to: Reply<i64>,
    },
    BeginTransaction {
        respond_to: Reply<()>,
    },
    CommitTx {
        respond_to: Reply<()>,
    },
    RollbackTx {
        respond_to: Reply<()>,
    },
    Shutdown,
}

/// A statement the worker keeps open and steps on request.
///
/// `replies` is released only after the statement has been finalized, so a
/// caller that waits for it to disconnect knows the statement is gone.
pub(crate) struct CursorCommand {
    pub query: String,
    pub params: Vec<Value>,
    pub opened: Reply<Vec<String>>,
    pub requests: Receiver<CursorRequest>,
    pub replies: Reply<Option<Vec<SqlValue>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorRequest {
    Next,
    Close,
}
