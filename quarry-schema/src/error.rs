//! Error types for schema construction and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building descriptors or loading configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(quarry::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid entity definition.
    #[error("invalid entity `{name}`: {message}")]
    #[diagnostic(code(quarry::schema::invalid_entity))]
    InvalidEntity { name: String, message: String },

    /// Invalid field definition.
    #[error("invalid field `{entity}.{field}`: {message}")]
    #[diagnostic(code(quarry::schema::invalid_field))]
    InvalidField {
        entity: String,
        field: String,
        message: String,
    },

    /// Invalid view definition.
    #[error("invalid view `{view}`: {message}")]
    #[diagnostic(code(quarry::schema::invalid_view))]
    InvalidView { view: String, message: String },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(quarry::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Field type missing from the catalog.
    #[error("unknown field type `{type_name}` in `{entity}.{field}`")]
    #[diagnostic(
        code(quarry::schema::unknown_field_type),
        help("declare it under [field_types] in quarry.toml")
    )]
    UnknownFieldType {
        entity: String,
        field: String,
        type_name: String,
    },

    /// Value type name outside the alias table.
    #[error("unknown value type `{name}`")]
    #[diagnostic(code(quarry::schema::unknown_value_type))]
    UnknownValueType { name: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(quarry::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(quarry::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Validation error with multiple issues.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(quarry::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create an invalid entity error.
    pub fn invalid_entity(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid view error.
    pub fn invalid_view(view: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidView {
            view: view.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an unknown field type error.
    pub fn unknown_field_type(
        entity: impl Into<String>,
        field: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::UnknownFieldType {
            entity: entity.into(),
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// Bundle several errors, or return the only one.
    pub fn collect(mut errors: Vec<SchemaError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => Some(Self::ValidationFailed { count, errors }),
        }
    }
}
