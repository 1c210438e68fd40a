use tracing::{debug, error};

use crate::error::SiloError;

use super::Driver;

impl Driver {
    /// Run `work` inside a transaction.
    ///
    /// If `work` fails the transaction is rolled back and its error is
    /// returned unchanged; a failed rollback is logged. If it succeeds the
    /// transaction is committed, and a failed commit is reported as
    /// [`SiloError::CommitError`]. Transactions do not nest.
    ///
    /// ```rust,no_run
    /// # use sql_silo::prelude::*;
    /// # fn demo(driver: &mut Driver) -> Result<(), SiloError> {
    /// driver.transaction(|tx| {
    ///     tx.insert(QueryState::new("audit").set("event", "login"), &["id"])?;
    ///     tx.update(QueryState::new("users").eq("id", 1).set("active", true))?;
    ///     Ok::<_, SiloError>(())
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// [`SiloError::TransactionError`] when a transaction is already open,
    /// the error returned by `work`, or [`SiloError::CommitError`].
    pub fn transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Driver) -> Result<T, E>,
        E: From<SiloError>,
    {
        self.begin()?;
        match work(self) {
            Ok(value) => {
                self.finish(true)
                    .map_err(|err| SiloError::CommitError(Box::new(err)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.finish(false) {
                    error!(error = %rollback_err, "rollback failed after unit of work error");
                }
                Err(err)
            }
        }
    }

    /// Whether a [`transaction`](Self::transaction) is currently running.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn begin(&mut self) -> Result<(), SiloError> {
        if self.in_transaction {
            return Err(SiloError::TransactionError(
                "nested transactions are not supported".into(),
            ));
        }
        debug!(dialect = ?self.dialect, "begin");
        self.connection.begin()?;
        self.in_transaction = true;
        Ok(())
    }

    fn finish(&mut self, commit: bool) -> Result<(), SiloError> {
        self.in_transaction = false;
        if commit {
            debug!(dialect = ?self.dialect, "commit");
            self.connection.commit()
        } else {
            debug!(dialect = ?self.dialect, "rollback");
            self.connection.rollback()
        }
    }
}
