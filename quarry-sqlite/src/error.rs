//! Error types for SQLite operations.

use thiserror::Error;

use quarry_query::QueryError;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Compiling, binding or extracting failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The wrapped query error, if any.
    pub fn as_query_error(&self) -> Option<&QueryError> {
        match self {
            Self::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Sqlite(e) => QueryError::database(e.to_string()).with_source(e),
            SqliteError::Query(e) => e,
            SqliteError::Config(msg) => QueryError::invalid_configuration(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_query::ErrorCode;

    #[test]
    fn test_error_display() {
        let err = SqliteError::config("invalid path");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("invalid path"));
    }

    #[test]
    fn test_error_conversion() {
        let err: QueryError = SqliteError::from(rusqlite::Error::InvalidQuery).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let inner = QueryError::unsupported("nope");
        let err: QueryError = SqliteError::from(inner).into();
        assert!(err.is_unsupported());

        let err: QueryError = SqliteError::config("bad").into();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }
}
