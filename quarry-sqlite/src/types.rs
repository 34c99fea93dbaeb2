//! Parameter binding for SQLite statements.

use rusqlite::Statement;
use rusqlite::ToSql;
use rusqlite::types::Null;

use quarry_query::{ParamSink, QueryError, QueryResult};

/// Binds values into a prepared statement's positional slots.
pub struct StatementBinder<'s, 'conn> {
    statement: &'s mut Statement<'conn>,
}

impl<'s, 'conn> StatementBinder<'s, 'conn> {
    /// Wrap a prepared statement.
    pub fn new(statement: &'s mut Statement<'conn>) -> Self {
        Self { statement }
    }

    fn bind<T: ToSql>(&mut self, index: usize, value: T) -> QueryResult<()> {
        self.statement
            .raw_bind_parameter(index, value)
            .map_err(|e| QueryError::bind_failed(index, e.to_string()).with_source(e))
    }
}

impl ParamSink for StatementBinder<'_, '_> {
    fn bind_null(&mut self, index: usize) -> QueryResult<()> {
        self.bind(index, Null)
    }

    fn bind_bool(&mut self, index: usize, value: bool) -> QueryResult<()> {
        self.bind(index, i64::from(value))
    }

    fn bind_i64(&mut self, index: usize, value: i64) -> QueryResult<()> {
        self.bind(index, value)
    }

    fn bind_f64(&mut self, index: usize, value: f64) -> QueryResult<()> {
        self.bind(index, value)
    }

    fn bind_text(&mut self, index: usize, value: &str) -> QueryResult<()> {
        self.bind(index, value)
    }

    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> QueryResult<()> {
        self.bind(index, value)
    }
}
