//! # Quarry
//!
//! A condition algebra for persistence layers, with two interpreters that
//! agree on null semantics:
//!
//! - a SQL compiler producing a `WHERE` fragment and ordered bind parameters
//! - an in-memory matcher evaluating the same tree against records
//!
//! Schema descriptors, value coercion, value handlers, ORDER BY handling and
//! an SQLite consumer round out the workspace.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use quarry::prelude::*;
//!
//! let person = EntityDescriptor::builder("Person")
//!     .typed_field("lastName", ValueType::String)
//!     .typed_field("age", ValueType::Long)
//!     .build(FieldTypeCatalog::builtin())?;
//!
//! let condition = Condition::and([
//!     Condition::like("lastName", "Sm%"),
//!     Condition::ne("age", 30),
//! ]);
//!
//! let compiled = condition.compile(&person, &DialectConfig::sqlite())?;
//! assert_eq!(
//!     compiled.sql,
//!     "(last_name LIKE ? AND (age <> ? OR age IS NULL))"
//! );
//!
//! let mut record = HashMap::new();
//! record.insert("lastName".to_string(), Value::from("Smith"));
//! assert!(condition.matches(&record)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema descriptors, field types and configuration.
pub mod schema {
    pub use quarry_schema::*;
}

/// Conditions, compilation, matching and value handling.
pub mod query {
    pub use quarry_query::*;
}

/// The SQLite consumer.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use quarry_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::{
        compile, filter_records, sort_records, ComparisonOperator, CompiledCondition, Condition,
        ConditionParam, FieldRef, FrozenCondition, JoinOperator, NullsOrder, OrderByField, QueryError,
        QueryResult, Record, Value, ValueExpr,
    };
    pub use crate::schema::{
        DialectConfig, EntityDescriptor, FieldSource, FieldSpec, FieldTypeCatalog, QuarryConfig,
        ValueType, ViewDescriptor,
    };
    #[cfg(feature = "sqlite")]
    pub use crate::sqlite::{SqliteConfig, SqliteEngine};
}

// Re-export key types at the crate root
pub use query::{Condition, QueryError, Value};
pub use schema::SchemaError;
