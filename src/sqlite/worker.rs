use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::error::SiloError;

mod channel;
mod dispatcher;

pub(crate) use channel::{Command, CursorCommand, CursorRequest, Reply};

use dispatcher::run_sqlite_worker;

/// Thread that owns a `rusqlite::Connection` and runs every statement on it.
pub(crate) struct SqliteWorker {
    sender: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl SqliteWorker {
    pub(crate) fn spawn(conn: rusqlite::Connection, label: &str) -> Result<Self, SiloError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let handle = thread::Builder::new()
            .name(format!("sqlite-worker-{label}"))
            .spawn(move || run_sqlite_worker(conn, &receiver))
            .map_err(|err| {
                SiloError::ConnectionError(format!("failed to spawn SQLite worker thread: {err}"))
            })?;
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    pub(crate) fn send_command(&self, command: Command) -> Result<(), SiloError> {
        self.sender
            .send(command)
            .map_err(|_| SiloError::ConnectionError("SQLite worker closed".into()))
    }

    /// Send a command and wait for its reply.
    pub(crate) fn request<T>(
        &self,
        what: &str,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SiloError> {
        let (tx, rx) = mpsc::channel();
        self.send_command(command(tx))?;
        rx.recv().map_err(|_| {
            SiloError::ConnectionError(format!("SQLite worker dropped while {what}"))
        })?
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sqlite worker thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for SqliteWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteWorker")
            .field("running", &self.handle.is_some())
            .finish()
    }
}
