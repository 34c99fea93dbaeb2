//! Column extraction from SQLite rows.

use rusqlite::Row;
use rusqlite::types::ValueRef;

use quarry_query::{ColumnKind, ColumnSource, QueryError, QueryResult};

/// Reads a result row by column position.
///
/// SQLite stores values by storage class, not declared type, so reads
/// convert leniently between integer, real and text storage.
pub struct RowReader<'r, 'stmt> {
    row: &'r Row<'stmt>,
}

impl<'r, 'stmt> RowReader<'r, 'stmt> {
    /// Wrap a result row.
    pub fn new(row: &'r Row<'stmt>) -> Self {
        Self { row }
    }

    fn value(&self, index: usize) -> QueryResult<ValueRef<'_>> {
        self.row
            .get_ref(index)
            .map_err(|e| QueryError::extract_failed(index, e.to_string()).with_source(e))
    }
}

fn text(index: usize, bytes: &[u8]) -> QueryResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| QueryError::extract_failed(index, e.to_string()))
}

fn mismatch(index: usize, wanted: &str, found: &ValueRef<'_>) -> QueryError {
    QueryError::extract_failed(index, format!("cannot read {:?} storage as {}", found.data_type(), wanted))
}

impl ColumnSource for RowReader<'_, '_> {
    fn column_kind(&self, index: usize) -> QueryResult<ColumnKind> {
        Ok(match self.value(index)? {
            ValueRef::Null => ColumnKind::Null,
            ValueRef::Integer(_) => ColumnKind::Integer,
            ValueRef::Real(_) => ColumnKind::Real,
            ValueRef::Text(_) => ColumnKind::Text,
            ValueRef::Blob(_) => ColumnKind::Blob,
        })
    }

    fn get_i64(&self, index: usize) -> QueryResult<i64> {
        match self.value(index)? {
            ValueRef::Integer(i) => Ok(i),
            ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Ok(f as i64),
            ValueRef::Text(bytes) => text(index, bytes)?
                .trim()
                .parse()
                .map_err(|_| QueryError::extract_failed(index, "text is not an integer")),
            other => Err(mismatch(index, "an integer", &other)),
        }
    }

    fn get_f64(&self, index: usize) -> QueryResult<f64> {
        match self.value(index)? {
            ValueRef::Integer(i) => Ok(i as f64),
            ValueRef::Real(f) => Ok(f),
            ValueRef::Text(bytes) => text(index, bytes)?
                .trim()
                .parse()
                .map_err(|_| QueryError::extract_failed(index, "text is not a number")),
            other => Err(mismatch(index, "a number", &other)),
        }
    }

    fn get_text(&self, index: usize) -> QueryResult<String> {
        match self.value(index)? {
            ValueRef::Text(bytes) => text(index, bytes).map(str::to_string),
            ValueRef::Integer(i) => Ok(i.to_string()),
            ValueRef::Real(f) => Ok(f.to_string()),
            other => Err(mismatch(index, "text", &other)),
        }
    }

    fn get_bytes(&self, index: usize) -> QueryResult<Vec<u8>> {
        match self.value(index)? {
            ValueRef::Blob(bytes) | ValueRef::Text(bytes) => Ok(bytes.to_vec()),
            other => Err(mismatch(index, "bytes", &other)),
        }
    }
}
