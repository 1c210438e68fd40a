use std::iter::FusedIterator;
use std::sync::Arc;

use crate::error::SiloError;
use crate::types::{SqlValue, ValueMap};

use super::row::{Columns, Row};

/// Backend side of a lazy result: yields raw rows one at a time.
///
/// Dropping a source must release the backend statement.
pub trait RowSource {
    fn columns(&self) -> &[String];

    /// Fetch the next row; `None` once exhausted.
    fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>>;

    /// Values the statement wrote back into in/out parameters.
    fn output_values(&mut self) -> ValueMap {
        ValueMap::new()
    }
}

/// Forward-only, single-pass cursor over the rows of a SELECT.
///
/// Rows are fetched from the live statement on demand. The cursor borrows
/// its driver, so the driver cannot run another statement until the cursor
/// is dropped; dropping it early releases the statement.
pub struct RowCursor<'c> {
    source: Box<dyn RowSource + 'c>,
    columns: Arc<Columns>,
    done: bool,
}

impl<'c> RowCursor<'c> {
    #[must_use]
    pub fn new(source: Box<dyn RowSource + 'c>) -> Self {
        let columns = Arc::new(Columns::new(source.columns().to_vec()));
        Self {
            source,
            columns,
            done: false,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Take the first row and release the statement.
    ///
    /// # Errors
    /// Returns the backend error raised while fetching the row.
    pub fn first_row(mut self) -> Result<Option<Row>, SiloError> {
        self.next().transpose()
    }
}

impl Iterator for RowCursor<'_> {
    type Item = Result<Row, SiloError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.next_row() {
            Some(Ok(values)) => Some(Ok(Row::with_columns(Arc::clone(&self.columns), values))),
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for RowCursor<'_> {}

impl std::fmt::Debug for RowCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("columns", &self.columns.names())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: std::collections::VecDeque<Vec<SqlValue>>,
}

impl MemoryRows {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }
}

impl RowSource for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>> {
        self.rows.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing {
        columns: Vec<String>,
        calls: usize,
    }

    impl RowSource for Failing {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SiloError>> {
            self.calls += 1;
            Some(Err(SiloError::execution("1", "boom")))
        }
    }

    #[test]
    fn yields_rows_lazily_in_order() {
        let source = MemoryRows::new(
            vec!["n".into()],
            vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
        );
        let mut cursor = RowCursor::new(Box::new(source));
        let first = cursor.next().expect("row").expect("ok");
        assert_eq!(first.get("n"), Some(&SqlValue::Int(1)));
        let rest: Vec<Row> = cursor.collect::<Result<_, _>>().expect("rows");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn stops_after_first_error() {
        let mut cursor = RowCursor::new(Box::new(Failing {
            columns: vec![],
            calls: 0,
        }));
        assert!(matches!(cursor.next(), Some(Err(_))));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn first_row_of_empty_result_is_none() {
        let cursor = RowCursor::new(Box::new(MemoryRows::new(vec!["n".into()], vec![])));
        assert!(cursor.first_row().expect("ok").is_none());
    }
}
