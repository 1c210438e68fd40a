use thiserror::Error;

/// Boxed backend error kept as the `source` of an [`SiloError::ExecutionError`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SiloError {
    /// Unresolvable connection name, missing primary key, invalid options.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The query declares a database the connection is not bound to.
    #[error("Connection is on database `{actual}`, query declares `{declared}`")]
    CrossDatabase { declared: String, actual: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// The backend rejected a statement.
    #[error("SQL execution error [{code}]: {message}")]
    ExecutionError {
        code: String,
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Commit failed after the unit of work itself succeeded.
    #[error("Commit failed: {0}")]
    CommitError(#[source] Box<SiloError>),

    #[error("Cannot decode column `{column}`: {message}")]
    DecodeError { column: String, message: String },
}

impl SiloError {
    /// Execution error without an underlying backend error value.
    pub fn execution(code: impl Into<String>, message: impl Into<String>) -> Self {
        SiloError::ExecutionError {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        SiloError::DecodeError {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Backend error code, for execution errors.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            SiloError::ExecutionError { code, .. } => Some(code),
            SiloError::CommitError(inner) => inner.code(),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SiloError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => ffi_err.extended_code.to_string(),
            rusqlite::Error::QueryReturnedNoRows => "no_rows".to_string(),
            _ => "client".to_string(),
        };
        SiloError::ExecutionError {
            code,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for SiloError {
    fn from(err: tokio_postgres::Error) -> Self {
        let code = err
            .code()
            .map_or_else(|| "client".to_string(), |state| state.code().to_string());
        let message = err
            .as_db_error()
            .map_or_else(|| err.to_string(), |db| db.message().to_string());
        SiloError::ExecutionError {
            code,
            message,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_error_exposes_inner_code() {
        let err = SiloError::CommitError(Box::new(SiloError::execution("40001", "serialization")));
        assert_eq!(err.code(), Some("40001"));
        assert!(err.to_string().starts_with("Commit failed:"));
    }

    #[test]
    fn config_error_has_no_code() {
        assert_eq!(SiloError::ConfigError("x".into()).code(), None);
    }
}
