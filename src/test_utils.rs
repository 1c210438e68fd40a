//! Connection double that records statements instead of running them.
//!
//! Useful for checking the SQL a dialect produces without a server:
//!
//! ```rust
//! use sql_silo::prelude::*;
//! use sql_silo::test_utils::RecordingConnection;
//!
//! let conn = RecordingConnection::new(Dialect::Mysql);
//! let log = conn.clone();
//! let mut driver = Driver::new(conn);
//! driver.delete(QueryState::new("t").eq("id", 3))?;
//! assert_eq!(log.statements(), vec!["DELETE FROM t WHERE id = ?"]);
//! # Ok::<(), SiloError>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connection::{BoundParam, Connection};
use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::results::{MemoryRows, RowSource};
use crate::types::{SqlValue, ValueMap};

/// One call the driver made on the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Query { sql: String, params: Vec<BoundParam> },
    Execute { sql: String, params: Vec<BoundParam> },
    Batch(String),
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct Script {
    log: Vec<Recorded>,
    results: VecDeque<MemoryRows>,
    affected: VecDeque<usize>,
    last_insert_id: Option<SqlValue>,
    output: ValueMap,
    pending_output: VecDeque<ValueMap>,
    fail_next: Option<SiloError>,
    fail_commit: Option<SiloError>,
}

/// Scripted, recording [`Connection`] for any dialect.
///
/// Clones share one log and script, so a clone kept by the test can inspect
/// what the driver did after the original moved into it.
#[derive(Debug, Clone)]
pub struct RecordingConnection {
    dialect: Dialect,
    shared: Arc<Mutex<Script>>,
}

impl RecordingConnection {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            shared: Arc::new(Mutex::new(Script::default())),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rows returned by the next query; queries without scripted rows
    /// return an empty result.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<SqlValue>>) {
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.script().results.push_back(MemoryRows::new(columns, rows));
    }

    /// Affected-row count of the next execute; the default is `1`.
    pub fn push_affected(&self, count: usize) {
        self.script().affected.push_back(count);
    }

    pub fn set_last_insert_id(&self, id: impl Into<SqlValue>) {
        self.script().last_insert_id = Some(id.into());
    }

    /// Values reported as written into in/out parameters.
    pub fn set_output(&self, values: ValueMap) {
        self.script().output = values;
    }

    /// Values the next query or execute writes into in/out parameters,
    /// replacing the current output from then on.
    pub fn push_output(&self, values: ValueMap) {
        self.script().pending_output.push_back(values);
    }

    /// Fail the next query, execute or batch with `err`.
    pub fn fail_next(&self, err: SiloError) {
        self.script().fail_next = Some(err);
    }

    /// Fail the next commit with `err`.
    pub fn fail_commit(&self, err: SiloError) {
        self.script().fail_commit = Some(err);
    }

    #[must_use]
    pub fn log(&self) -> Vec<Recorded> {
        self.script().log.clone()
    }

    /// SQL of every query and execute, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.script()
            .log
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Query { sql, .. } | Recorded::Execute { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Parameters of the last query or execute.
    #[must_use]
    pub fn last_params(&self) -> Vec<BoundParam> {
        self.script()
            .log
            .iter()
            .rev()
            .find_map(|entry| match entry {
                Recorded::Query { params, .. } | Recorded::Execute { params, .. } => {
                    Some(params.clone())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.script().log.clear();
    }

    fn record(&self, entry: Recorded) -> Result<(), SiloError> {
        let mut script = self.script();
        if matches!(entry, Recorded::Query { .. } | Recorded::Execute { .. }) {
            if let Some(output) = script.pending_output.pop_front() {
                script.output = output;
            }
        }
        script.log.push(entry);
        match script.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Connection for RecordingConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&mut self, sql: &str, params: &[BoundParam]) -> Result<Box<dyn RowSource + '_>, SiloError> {
        self.record(Recorded::Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        })?;
        let mut script = self.script();
        let rows = script.results.pop_front().unwrap_or_default();
        Ok(Box::new(RecordedRows {
            rows,
            output: script.output.clone(),
        }))
    }

    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<usize, SiloError> {
        self.record(Recorded::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        })?;
        Ok(self.script().affected.pop_front().unwrap_or(1))
    }

    fn last_insert_id(&mut self) -> Result<Option<SqlValue>, SiloError> {
        Ok(self.script().last_insert_id.clone())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SiloError> {
        self.record(Recorded::Batch(sql.to_string()))
    }

    fn begin(&mut self) -> Result<(), SiloError> {
        self.script().log.push(Recorded::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SiloError> {
        let mut script = self.script();
        script.log.push(Recorded::Commit);
        match script.fail_commit.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), SiloError> {
        self.script().log.push(Recorded::Rollback);
        Ok(())
    }

    fn output_values(&mut self) -> ValueMap {
        self.script().output.clone()
    }
}

/// Scripted rows plus the outputs the recorded query wrote.
struct RecordedRows {
    rows: MemoryRows,
    output: ValueMap,
}

impl RowSource for RecordedRows {
    fn columns(&self) -> &[String] {
        self.rows.columns()
    }

    fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>> {
        self.rows.next_row()
    }

    fn output_values(&mut self) -> ValueMap {
        self.output.clone()
    }
}
