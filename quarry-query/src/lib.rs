//! # quarry-query
//!
//! Condition algebra for the Quarry persistence core.
//!
//! This crate provides:
//! - A condition tree (comparisons, joins, field maps, negation, date ranges)
//!   with factories and a shareable frozen form
//! - An operator registry that resolves operator names and aliases
//! - A SQL compiler producing a WHERE fragment and ordered bind parameters
//! - An in-memory matcher with the same null semantics as the compiled SQL
//! - Value coercion and the value handlers that bind and extract columns
//! - ORDER BY rendering, in-memory sorting and view FROM clauses
//!
//! ## Compiling
//!
//! ```rust
//! use quarry_query::{compile, Condition};
//! use quarry_schema::{DialectConfig, EntityDescriptor, FieldTypeCatalog, ValueType};
//!
//! let person = EntityDescriptor::builder("Person")
//!     .typed_field("status", ValueType::String)
//!     .typed_field("nickName", ValueType::String)
//!     .build(FieldTypeCatalog::builtin())
//!     .unwrap();
//!
//! let condition = Condition::or([
//!     Condition::eq("status", "ACTIVE"),
//!     Condition::ne("nickName", "Bob"),
//! ]);
//! let compiled = compile(&condition, &person, &DialectConfig::default()).unwrap();
//! assert_eq!(compiled.sql, "(status = ? OR (nick_name <> ? OR nick_name IS NULL))");
//! assert_eq!(compiled.params.len(), 2);
//! ```
//!
//! ## Matching
//!
//! ```rust
//! use std::collections::HashMap;
//! use quarry_query::{Condition, Value};
//!
//! let mut record = HashMap::new();
//! record.insert("status".to_string(), Value::from("ACTIVE"));
//!
//! let condition = Condition::and([
//!     Condition::eq("status", "ACTIVE"),
//!     Condition::eq("deletedAt", Value::Null),
//! ]);
//! assert!(condition.matches(&record).unwrap());
//! ```
//!
//! ## Sorting
//!
//! ```rust
//! use quarry_query::{NullsOrder, OrderByField};
//!
//! let order: OrderByField = "createdAt DESC NULLS LAST".parse().unwrap();
//! assert_eq!(order, OrderByField::desc("createdAt").nulls(NullsOrder::Last));
//! ```

pub mod coerce;
pub mod compare;
pub mod compile;
pub mod condition;
pub mod encrypt;
pub mod error;
pub mod handler;
pub mod like;
pub mod logging;
pub mod matcher;
pub mod operator;
pub mod order;
pub mod record;
pub mod value;
pub mod view;
pub mod visitor;

pub use coerce::{coerce, coerce_named, Coercer, Locale};
pub use compile::{check, compile, CompiledCondition, ConditionParam};
pub use condition::{Condition, FieldRef, FrozenCondition, Function, ValueExpr};
pub use encrypt::{encrypt_fields, FieldEncryptor};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use handler::{ColumnKind, ColumnSource, HandlerRegistry, ParamSink, ValueHandler};
pub use matcher::{filter_by_and, filter_by_date, filter_records, first_match, matches};
pub use operator::{ComparisonOperator, JoinOperator, Operator, OperatorRegistry};
pub use order::{order_by_clause, parse_order_by, sort_records, NullsOrder, OrderByField};
pub use record::{coerce_record, Record};
pub use value::Value;
pub use view::{from_clause, select_columns, FromClause};
pub use visitor::{referenced_fields, walk, ConditionVisitor};

// Re-export logging utilities
pub use logging::{init as init_logging, init_debug, is_debug_enabled};
