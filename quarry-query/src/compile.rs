//! Condition to SQL compilation.
//!
//! The compiler produces a WHERE fragment plus the parameters to bind, in
//! placeholder order. Emission is null-aware so that the database and the
//! in-memory matcher agree on every row:
//!
//! - `col = NULL` is emitted as `col IS NULL`, `col <> NULL` as `col IS NOT NULL`
//! - `col <> ?` is emitted as `(col <> ? OR col IS NULL)`
//! - `NOT IN` keeps null columns: `(col NOT IN (...) OR col IS NULL)`
//! - `NOT x` is emitted as `NOT COALESCE(x, FALSE)` unless the dialect opts out
//!
//! ```rust
//! use quarry_query::{compile, Condition};
//! use quarry_schema::{DialectConfig, EntityDescriptor, FieldTypeCatalog, ValueType};
//!
//! let person = EntityDescriptor::builder("Person")
//!     .typed_field("status", ValueType::String)
//!     .typed_field("age", ValueType::Integer)
//!     .build(FieldTypeCatalog::builtin())
//!     .unwrap();
//!
//! let condition = Condition::and([Condition::eq("status", "ACTIVE"), Condition::gt("age", 18)]);
//! let compiled = compile(&condition, &person, &DialectConfig::default()).unwrap();
//! assert_eq!(compiled.sql, "(status = ? AND age > ?)");
//! assert_eq!(compiled.params.len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use quarry_schema::{DialectConfig, FieldDescriptor, FieldSource, TypeMismatchPolicy, ValueType};

use crate::coerce::{coerce, fractional_number};
use crate::condition::{Condition, FieldRef, ValueExpr};
use crate::error::{QueryError, QueryResult};
use crate::handler::{HandlerRegistry, ParamSink, ValueHandler};
use crate::logging;
use crate::operator::{between_bounds, ComparisonOperator, JoinOperator};
use crate::value::Value;
use crate::visitor::{walk, ConditionVisitor};

/// A literal bound to a placeholder, with the field it is compared against.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionParam {
    /// The field whose handler binds the value.
    pub field: Arc<FieldDescriptor>,
    /// The coerced value.
    pub value: Value,
}

impl ConditionParam {
    /// Create a parameter.
    pub fn new(field: Arc<FieldDescriptor>, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// The handler used for binding: the field's own handler when the value
    /// has the field's type, otherwise the value's natural handler.
    pub fn handler(&self) -> ValueHandler {
        if self.value.is_instance_of(self.field.value_type()) {
            HandlerRegistry::global().for_field(&self.field)
        } else {
            ValueHandler::natural(&self.value)
        }
    }

    /// Bind into a statement slot (1-based).
    pub fn bind(&self, sink: &mut dyn ParamSink, index: usize) -> QueryResult<()> {
        self.handler()
            .bind(sink, index, &self.value)
            .map_err(|e| e.with_field(self.field.name()))
    }
}

impl fmt::Display for ConditionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field.name(), self.value)
    }
}

/// A compiled WHERE fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledCondition {
    /// SQL text, empty when the condition constrains nothing.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<ConditionParam>,
}

impl CompiledCondition {
    /// Whether there is nothing to put after `WHERE`.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// `" WHERE <sql>"`, or an empty string.
    pub fn where_clause(&self) -> String {
        if self.sql.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }

    /// Count `?` and `$n` placeholders outside quoted text.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut quoted = false;
        let mut chars = self.sql.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\'' => quoted = !quoted,
                '?' if !quoted => count += 1,
                '$' if !quoted && chars.peek().is_some_and(char::is_ascii_digit) => {
                    count += 1;
                    while chars.peek().is_some_and(char::is_ascii_digit) {
                        chars.next();
                    }
                }
                _ => {}
            }
        }
        count
    }

    /// The bound values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.params.iter().map(|p| &p.value)
    }

    /// Bind every parameter, starting at slot 1.
    pub fn bind_all(&self, sink: &mut dyn ParamSink) -> QueryResult<()> {
        self.bind_from(sink, 1)
    }

    /// Bind every parameter, starting at slot `first`.
    pub fn bind_from(&self, sink: &mut dyn ParamSink, first: usize) -> QueryResult<()> {
        for (offset, param) in self.params.iter().enumerate() {
            param.bind(sink, first + offset)?;
        }
        Ok(())
    }
}

/// Compile `condition` against a schema.
pub fn compile(
    condition: &Condition,
    source: &dyn FieldSource,
    dialect: &DialectConfig,
) -> QueryResult<CompiledCondition> {
    let mut compiler = SqlCompiler::new(source, dialect);
    let sql = compiler
        .condition(condition)
        .map_err(|e| e.with_context(format!("compiling condition for {}", source.source_name())))?;
    let compiled = CompiledCondition {
        sql,
        params: compiler.params,
    };

    if logging::log_sql_enabled() {
        if logging::log_params_enabled() {
            let params: Vec<String> = compiled.params.iter().map(ToString::to_string).collect();
            tracing::debug!(
                source = source.source_name(),
                sql = %compiled.sql,
                params = ?params,
                "Compiled condition"
            );
        } else {
            tracing::debug!(
                source = source.source_name(),
                sql = %compiled.sql,
                param_count = compiled.params.len(),
                "Compiled condition"
            );
        }
    }
    Ok(compiled)
}

/// Validate field references, operand shapes and literal types without
/// producing SQL. Type mismatches are always errors here.
pub fn check(condition: &Condition, source: &dyn FieldSource) -> QueryResult<()> {
    let dialect = DialectConfig::default();
    let mut checker = Checker {
        compiler: SqlCompiler::new(source, &dialect),
        error: None,
    };
    walk(condition, &mut checker);
    match checker.error {
        Some(err) => Err(err.with_context(format!("checking condition for {}", source.source_name()))),
        None => Ok(()),
    }
}

impl Condition {
    /// Compile against a schema. See [`compile`].
    pub fn compile(&self, source: &dyn FieldSource, dialect: &DialectConfig) -> QueryResult<CompiledCondition> {
        compile(self, source, dialect)
    }

    /// Validate against a schema. See [`check`].
    pub fn check(&self, source: &dyn FieldSource) -> QueryResult<()> {
        check(self, source)
    }
}

/// A resolved non-literal operand.
struct Column {
    sql: String,
    field: Arc<FieldDescriptor>,
    value_type: ValueType,
}

struct SqlCompiler<'a> {
    source: &'a dyn FieldSource,
    dialect: &'a DialectConfig,
    params: Vec<ConditionParam>,
}

impl<'a> SqlCompiler<'a> {
    fn new(source: &'a dyn FieldSource, dialect: &'a DialectConfig) -> Self {
        Self {
            source,
            dialect,
            params: Vec::new(),
        }
    }

    fn condition(&mut self, condition: &Condition) -> QueryResult<String> {
        match condition {
            Condition::Comparison { lhs, op, rhs } => self.comparison(lhs, *op, rhs),
            Condition::Join { op, operands } => self.join(*op, operands),
            Condition::FieldMap { .. } | Condition::DateRange { .. } => match condition.expand() {
                Some(expanded) => self.condition(&expanded),
                None => Ok(String::new()),
            },
            Condition::Not { inner } => {
                let inner = self.condition(inner)?;
                Ok(if inner.is_empty() {
                    inner
                } else if self.dialect.null_safe_negation {
                    format!("NOT COALESCE({}, FALSE)", inner)
                } else {
                    format!("NOT ({})", inner)
                })
            }
            Condition::Raw { text } if text.trim().is_empty() => Ok(String::new()),
            Condition::Raw { text } => Ok(text.clone()),
        }
    }

    fn join(&mut self, op: JoinOperator, operands: &[Condition]) -> QueryResult<String> {
        let mut parts = Vec::with_capacity(operands.len());
        for operand in operands {
            let sql = self.condition(operand)?;
            if !sql.is_empty() {
                parts.push(sql);
            }
        }
        Ok(match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => format!("({})", parts.join(&format!(" {} ", op.sql_token()))),
        })
    }

    fn comparison(&mut self, lhs: &ValueExpr, op: ComparisonOperator, rhs: &ValueExpr) -> QueryResult<String> {
        match (lhs, rhs) {
            (ValueExpr::Literal(_), ValueExpr::Literal(_)) => Err(QueryError::invalid_condition(
                "a comparison needs at least one field operand",
            )
            .with_operator(op.sql_token())),
            (expr, ValueExpr::Literal(value)) => {
                let column = self.resolve(expr)?;
                let value = self.coerce_literal(&column, op, value)?;
                self.against_literal(&column, op, value, false)
            }
            (ValueExpr::Literal(value), expr) => {
                if op.takes_list() {
                    return Err(right_hand_collection(op));
                }
                let column = self.resolve(expr)?;
                let value = self.coerce_literal(&column, op, value)?;
                self.against_literal(&column, op, value, true)
            }
            (left, right) => {
                if op.takes_list() {
                    return Err(right_hand_collection(op));
                }
                let left = self.resolve(left)?;
                let right = self.resolve(right)?;
                Ok(match op {
                    ComparisonOperator::Equals => {
                        format!("{} {} {}", left.sql, self.dialect.null_safe_equals, right.sql)
                    }
                    ComparisonOperator::NotEquals => {
                        format!("NOT ({} {} {})", left.sql, self.dialect.null_safe_equals, right.sql)
                    }
                    _ => format!("{} {} {}", left.sql, op.sql_token(), right.sql),
                })
            }
        }
    }

    fn against_literal(
        &mut self,
        column: &Column,
        op: ComparisonOperator,
        value: Value,
        literal_first: bool,
    ) -> QueryResult<String> {
        use ComparisonOperator as C;

        let col = &column.sql;
        let binary = |placeholder: String| {
            if literal_first {
                format!("{} {} {}", placeholder, op.sql_token(), col)
            } else {
                format!("{} {} {}", col, op.sql_token(), placeholder)
            }
        };

        Ok(match op {
            C::Equals if value.is_null() => format!("{} IS NULL", col),
            C::NotEquals if value.is_null() => format!("{} IS NOT NULL", col),
            C::NotEquals => {
                let placeholder = self.bind(column, value);
                format!("({} OR {} IS NULL)", binary(placeholder), col)
            }
            C::Equals
            | C::LessThan
            | C::GreaterThan
            | C::LessThanEqualTo
            | C::GreaterThanEqualTo
            | C::Like
            | C::NotLike => {
                let placeholder = self.bind(column, value);
                binary(placeholder)
            }
            C::In | C::NotIn => self.membership(column, op, value),
            C::Between => {
                let (low, high) = between_bounds(&value)?;
                let low = self.bind(column, low.clone());
                let high = self.bind(column, high.clone());
                format!("{} BETWEEN {} AND {}", col, low, high)
            }
        })
    }

    fn membership(&mut self, column: &Column, op: ComparisonOperator, value: Value) -> String {
        let col = &column.sql;
        let items = match value {
            Value::List(items) => items,
            single => vec![single],
        };
        let has_null = items.iter().any(Value::is_null);
        let negated = op == ComparisonOperator::NotIn;
        let present: Vec<Value> = items.into_iter().filter(|v| !v.is_null()).collect();

        if present.is_empty() {
            return match (negated, has_null) {
                (false, false) => "1=0".to_string(),
                (true, false) => "1=1".to_string(),
                (false, true) => format!("{} IS NULL", col),
                (true, true) => format!("{} IS NOT NULL", col),
            };
        }

        let placeholders: Vec<String> = present.into_iter().map(|v| self.bind(column, v)).collect();
        let list = format!("{} {} ({})", col, op.sql_token(), placeholders.join(", "));
        match (negated, has_null) {
            (false, false) => list,
            (false, true) | (true, false) => format!("({} OR {} IS NULL)", list, col),
            (true, true) => format!("({} AND {} IS NOT NULL)", list, col),
        }
    }

    fn bind(&mut self, column: &Column, value: Value) -> String {
        self.params.push(ConditionParam {
            field: Arc::clone(&column.field),
            value,
        });
        self.dialect.placeholder.placeholder(self.params.len())
    }

    fn resolve(&self, expr: &ValueExpr) -> QueryResult<Column> {
        match expr {
            ValueExpr::Field(field) => self.resolve_field(field),
            ValueExpr::Function { kind, operand } => {
                let inner = self.resolve(operand)?;
                Ok(Column {
                    sql: format!("{}({})", kind.sql_name(), inner.sql),
                    value_type: kind.result_type(inner.value_type),
                    field: inner.field,
                })
            }
            ValueExpr::Literal(value) => Err(QueryError::invalid_condition(format!(
                "function operand must be a field, found literal {}",
                value
            ))),
        }
    }

    fn resolve_field(&self, field: &FieldRef) -> QueryResult<Column> {
        let resolved = self
            .source
            .resolve(field.name(), field.alias())
            .ok_or_else(|| {
                QueryError::unknown_field(self.source.source_name(), field.to_string(), self.source.field_names())
            })?;
        Ok(Column {
            value_type: resolved.field.value_type(),
            sql: resolved.column,
            field: resolved.field,
        })
    }

    fn coerce_literal(&self, column: &Column, op: ComparisonOperator, value: &Value) -> QueryResult<Value> {
        let target = if op.is_pattern() {
            ValueType::String
        } else {
            column.value_type
        };
        match value {
            Value::List(items) if op.takes_list() => items
                .iter()
                .map(|item| self.coerce_one(column, target, item))
                .collect::<QueryResult<Vec<_>>>()
                .map(Value::List),
            other => self.coerce_one(column, target, other),
        }
    }

    fn coerce_one(&self, column: &Column, target: ValueType, value: &Value) -> QueryResult<Value> {
        if value.is_instance_of(target) {
            return Ok(value.clone());
        }
        if matches!(target, ValueType::Integer | ValueType::Long) {
            // Narrowing would change which rows match.
            if let Some(fractional) = fractional_number(value) {
                return Ok(fractional);
            }
        }
        match coerce(value.clone(), target, None, None, true) {
            Ok(coerced) => Ok(coerced),
            Err(err) => match self.dialect.type_mismatch {
                TypeMismatchPolicy::Error => {
                    Err(QueryError::type_mismatch(column.field.name(), target, value.type_name())
                        .with_entity(self.source.source_name())
                        .with_source(err))
                }
                TypeMismatchPolicy::Warn => {
                    tracing::warn!(
                        source = self.source.source_name(),
                        field = column.field.name(),
                        expected = %target,
                        actual = value.type_name(),
                        "Literal does not match field type, binding as given"
                    );
                    Ok(value.clone())
                }
            },
        }
    }
}

fn right_hand_collection(op: ComparisonOperator) -> QueryError {
    QueryError::invalid_condition(format!("{} needs a literal collection on the right-hand side", op))
        .with_operator(op.sql_token())
}

/// Runs each comparison through a scratch compiler and keeps the first error.
struct Checker<'a> {
    compiler: SqlCompiler<'a>,
    error: Option<QueryError>,
}

impl Checker<'_> {
    fn record(&mut self, result: QueryResult<String>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
        self.compiler.params.clear();
    }
}

impl ConditionVisitor for Checker<'_> {
    fn visit_comparison(&mut self, lhs: &ValueExpr, op: ComparisonOperator, rhs: &ValueExpr) {
        let result = self.compiler.comparison(lhs, op, rhs);
        self.record(result);
    }

    fn visit_field_map(
        &mut self,
        pairs: &indexmap::IndexMap<smol_str::SmolStr, Value>,
        compare_op: ComparisonOperator,
        _join_op: JoinOperator,
    ) {
        for (name, value) in pairs {
            let result = self.compiler.comparison(
                &ValueExpr::Field(FieldRef::new(name.clone())),
                compare_op,
                &ValueExpr::Literal(value.clone()),
            );
            self.record(result);
        }
    }

    fn visit_date_range(&mut self, from_field: &str, thru_field: &str, _moment: Option<chrono::NaiveDateTime>) {
        for name in [thru_field, from_field] {
            let result = self
                .compiler
                .resolve_field(&FieldRef::new(name))
                .map(|column| column.sql);
            self.record(result);
        }
    }
}
