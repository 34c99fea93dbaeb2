//! # quarry-schema
//!
//! Schema descriptors for the Quarry persistence core.
//!
//! This crate provides:
//! - Entity, field and view descriptors, built and validated through builders
//! - The closed [`ValueType`] enum with its fixed alias table
//! - The field type catalog mapping names like `long-varchar` to value and SQL types
//! - Configuration parser for `quarry.toml` files, including the SQL dialect
//!
//! ## Example
//!
//! ```rust
//! use quarry_schema::{EntityDescriptor, FieldSource, FieldSpec, FieldTypeCatalog, QuarryConfig};
//!
//! let config = QuarryConfig::from_str(r#"
//!     [field_types.tiny-id]
//!     java_type = "String"
//!     sql_type = "VARCHAR(5)"
//! "#).unwrap();
//! let catalog = config.field_type_catalog().unwrap();
//!
//! let person = EntityDescriptor::builder("Person")
//!     .field(FieldSpec::new("partyId", "tiny-id").pk())
//!     .field(FieldSpec::new("firstName", "name"))
//!     .build(&catalog)
//!     .unwrap();
//!
//! assert_eq!(person.resolve("firstName", None).unwrap().column, "first_name");
//! ```

pub mod config;
pub mod error;
pub mod field_type;
pub mod model;
pub mod source;
pub mod types;

pub use config::{
    CoercionConfig, DebugConfig, DialectConfig, JoinStyle, PlaceholderStyle, QuarryConfig,
    TypeMismatchPolicy,
};
pub use error::{SchemaError, SchemaResult};
pub use field_type::{FieldType, FieldTypeCatalog, FieldTypeConfig};
pub use model::{
    EntityBuilder, EntityDescriptor, FieldDescriptor, FieldSpec, KeyMap, ViewAlias, ViewBuilder,
    ViewDescriptor, ViewLink, ViewMember,
};
pub use source::{FieldSource, ResolvedField};
pub use types::ValueType;
