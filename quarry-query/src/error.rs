//! Error types for condition compilation, matching and value coercion.
//!
//! Every error carries an [`ErrorCode`] for programmatic handling, a message,
//! and an [`ErrorContext`] describing where it happened.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: Q{category}{number}
//! - 1xxx: Structural errors (unknown field, arity, unsupported operation)
//! - 2xxx: Type errors (type mismatch, coercion failure, unknown type)
//! - 3xxx: Binding errors (parameter bind, column extract, driver)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! Structural errors are never recoverable: the query build must be aborted.
//! Type errors may be downgraded to warnings by the caller's policy.
//!
//! ```rust
//! use quarry_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_field("Party", "stauts", ["status", "partyId"]);
//! assert_eq!(err.code, ErrorCode::UnknownField);
//! assert!(err.is_structural());
//! assert!(err.to_string().starts_with("[Q1001]"));
//! ```

use std::fmt;
use thiserror::Error;

use quarry_schema::{SchemaError, ValueType};

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Structural errors (1xxx)
    /// Field reference does not resolve (Q1001).
    UnknownField = 1001,
    /// Operator given the wrong number of operands (Q1002).
    OperatorArity = 1002,
    /// Operator name not in the registry (Q1003).
    UnknownOperator = 1003,
    /// Malformed condition tree (Q1004).
    InvalidCondition = 1004,
    /// Operation not supported by this interpreter (Q1005).
    UnsupportedOperation = 1005,

    // Type errors (2xxx)
    /// Bound value incompatible with the field type (Q2001).
    SchemaTypeMismatch = 2001,
    /// Value could not be converted (Q2002).
    Coercion = 2002,
    /// Type name not in the alias table (Q2003).
    UnknownType = 2003,

    // Binding errors (3xxx)
    /// Parameter could not be bound (Q3001).
    BindFailed = 3001,
    /// Column could not be extracted (Q3002).
    ExtractFailed = 3002,
    /// Error reported by the database driver (Q3003).
    DatabaseError = 3003,

    // Configuration errors (7xxx)
    /// Invalid configuration (Q7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (Q9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "Q1001").
    pub fn code(&self) -> String {
        format!("Q{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownField => "Unknown field",
            Self::OperatorArity => "Wrong number of operands",
            Self::UnknownOperator => "Unknown operator",
            Self::InvalidCondition => "Invalid condition",
            Self::UnsupportedOperation => "Unsupported operation",
            Self::SchemaTypeMismatch => "Value does not match the field type",
            Self::Coercion => "Value coercion failed",
            Self::UnknownType => "Unknown type",
            Self::BindFailed => "Parameter bind failed",
            Self::ExtractFailed => "Column extract failed",
            Self::DatabaseError => "Database error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The entity or view involved.
    pub entity: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The operator involved.
    pub operator: Option<String>,
    /// The SQL text (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while building, compiling or evaluating conditions.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the operator.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.context.operator = Some(operator.into());
        self
    }

    /// Set the SQL text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an unknown field error, suggesting the closest known names.
    pub fn unknown_field<'a>(
        source: impl Into<String>,
        field: impl Into<String>,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let source = source.into();
        let field = field.into();
        let mut err = Self::new(
            ErrorCode::UnknownField,
            format!("{} has no field named `{}`", source, field),
        )
        .with_entity(&source)
        .with_field(&field);

        let lowered = field.to_ascii_lowercase();
        for candidate in known {
            let c = candidate.to_ascii_lowercase();
            if c == lowered || c.contains(&lowered) || lowered.contains(&c) || edit_distance(&c, &lowered) <= 2 {
                err = err.with_suggestion(format!("did you mean `{}`?", candidate));
            }
        }
        err
    }

    /// Create an operator arity error.
    pub fn operator_arity(operator: impl Into<String>, expected: &str, actual: usize) -> Self {
        let operator = operator.into();
        Self::new(
            ErrorCode::OperatorArity,
            format!("{} expects {} but was given {}", operator, expected, actual),
        )
        .with_operator(&operator)
    }

    /// Create an unknown operator error.
    pub fn unknown_operator(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorCode::UnknownOperator, format!("unknown operator `{}`", name))
            .with_operator(&name)
            .with_help("operators are looked up by name, e.g. `equals`, `not-equal`, `!=`, `in`")
    }

    /// Create an invalid condition error.
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCondition, message)
    }

    /// Create an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedOperation, message)
    }

    /// Create a type mismatch error for a value bound against a field.
    pub fn type_mismatch(field: impl Into<String>, expected: ValueType, actual: &str) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::SchemaTypeMismatch,
            format!(
                "value of type {} is not compatible with field `{}` of type {}",
                actual, field, expected
            ),
        )
        .with_field(&field)
    }

    /// Create a coercion error naming both the source and target types.
    pub fn coercion(from: impl fmt::Display, to: impl fmt::Display, detail: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Coercion,
            format!("cannot convert {} to {}: {}", from, to, detail.into()),
        )
    }

    /// Create an unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorCode::UnknownType, format!("unknown type `{}`", name))
            .with_help("type names are resolved through a fixed alias table, e.g. `String`, `java.sql.Timestamp`")
    }

    /// Create a parameter bind error.
    pub fn bind_failed(index: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::BindFailed,
            format!("failed to bind parameter {}: {}", index, message.into()),
        )
    }

    /// Create a column extract error.
    pub fn extract_failed(index: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExtractFailed,
            format!("failed to extract column {}: {}", index, message.into()),
        )
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Errors that must abort the query build.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownField
                | ErrorCode::OperatorArity
                | ErrorCode::UnknownOperator
                | ErrorCode::InvalidCondition
                | ErrorCode::UnsupportedOperation
                | ErrorCode::UnknownType
        )
    }

    /// Errors a permissive caller may downgrade to a warning.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.code, ErrorCode::SchemaTypeMismatch | ErrorCode::Coercion)
    }

    /// Check if this is an unknown field error.
    pub fn is_unknown_field(&self) -> bool {
        self.code == ErrorCode::UnknownField
    }

    /// Check if this is an unsupported operation error.
    pub fn is_unsupported(&self) -> bool {
        self.code == ErrorCode::UnsupportedOperation
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  → Entity: {}\n", entity));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref operator) = self.context.operator {
            output.push_str(&format!("  → Operator: {}\n", operator));
        }

        // SQL (truncated if too long)
        if let Some(ref sql) = self.context.sql {
            let sql_display = match sql.char_indices().nth(200) {
                Some((end, _)) => format!("{}...", &sql[..end]),
                None => sql.clone(),
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        let code = match &err {
            SchemaError::UnknownValueType { .. } => ErrorCode::UnknownType,
            _ => ErrorCode::InvalidConfiguration,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut cur = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        prev = cur;
    }
    prev[b.len()]
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
