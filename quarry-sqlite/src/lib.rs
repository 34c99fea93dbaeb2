//! SQLite consumer for Quarry conditions.
//!
//! This crate prepares and runs statements against SQLite through
//! `rusqlite`: conditions are compiled with the SQLite dialect, literals are
//! bound through the value handler chosen for each field, and result columns
//! are extracted the same way into records keyed by logical field name.
//!
//! # Example
//!
//! ```rust
//! use quarry_query::{Condition, OrderByField, Value};
//! use quarry_schema::{EntityDescriptor, FieldSpec, FieldTypeCatalog, ValueType};
//! use quarry_sqlite::SqliteEngine;
//!
//! let person = EntityDescriptor::builder("Person")
//!     .field(FieldSpec::typed("id", ValueType::Long).pk())
//!     .typed_field("name", ValueType::String)
//!     .build(FieldTypeCatalog::builtin())
//!     .unwrap();
//!
//! let engine = SqliteEngine::open_in_memory().unwrap();
//! engine.create_table(&person).unwrap();
//! engine
//!     .execute_batch("INSERT INTO person (id, name) VALUES (1, 'Ann'), (2, NULL)")
//!     .unwrap();
//!
//! let rows = engine
//!     .find(&person, &Condition::ne("name", "Ann"), &[OrderByField::asc("id")])
//!     .unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0]["name"], Value::Null);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod row;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use engine::{SqliteEngine, SqliteRow};
pub use error::{SqliteError, SqliteResult};
pub use row::RowReader;
pub use types::StatementBinder;
