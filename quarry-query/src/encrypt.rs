//! Literal rewriting for fields stored encrypted.
//!
//! Encrypted columns can only be compared for equality, so conditions on
//! them are limited to `=`, `<>`, `IN` and `NOT IN` against literals.

use quarry_schema::{EntityDescriptor, FieldDescriptor};

use crate::condition::{Condition, ValueExpr};
use crate::error::{QueryError, QueryResult};
use crate::operator::ComparisonOperator;
use crate::value::Value;

/// Encrypts values bound against encrypted fields.
pub trait FieldEncryptor: Send + Sync {
    /// Encrypt a single non-null value for `field` of `entity`.
    fn encrypt(&self, entity: &str, field: &FieldDescriptor, value: &Value) -> QueryResult<Value>;
}

/// Rewrite the literals of `condition` that are compared against encrypted
/// fields of `entity`.
///
/// Nulls pass through unchanged, and list literals are encrypted element by
/// element. Ordering, pattern and function comparisons on an encrypted field
/// are rejected.
pub fn encrypt_fields(
    condition: &Condition,
    entity: &EntityDescriptor,
    encryptor: &dyn FieldEncryptor,
) -> QueryResult<Condition> {
    if !entity.has_encrypted_fields() {
        return Ok(condition.clone());
    }
    Rewriter { entity, encryptor }.condition(condition)
}

struct Rewriter<'a> {
    entity: &'a EntityDescriptor,
    encryptor: &'a dyn FieldEncryptor,
}

impl Rewriter<'_> {
    fn condition(&self, condition: &Condition) -> QueryResult<Condition> {
        Ok(match condition {
            Condition::Comparison { lhs, op, rhs } => Condition::Comparison {
                lhs: self.operand(lhs, *op, rhs)?,
                op: *op,
                rhs: self.operand(rhs, *op, lhs)?,
            },
            Condition::Join { op, operands } => Condition::Join {
                op: *op,
                operands: operands.iter().map(|c| self.condition(c)).collect::<QueryResult<_>>()?,
            },
            Condition::FieldMap {
                pairs,
                compare_op,
                join_op,
            } => {
                let mut rewritten = pairs.clone();
                for (name, value) in rewritten.iter_mut() {
                    if let Some(field) = self.encrypted(name) {
                        *value = self.literal(field, *compare_op, value)?;
                    }
                }
                Condition::FieldMap {
                    pairs: rewritten,
                    compare_op: *compare_op,
                    join_op: *join_op,
                }
            }
            Condition::Not { inner } => Condition::Not {
                inner: Box::new(self.condition(inner)?),
            },
            Condition::DateRange { .. } | Condition::Raw { .. } => condition.clone(),
        })
    }

    /// Rewrite `expr` if it is a literal and `other` is an encrypted field.
    fn operand(&self, expr: &ValueExpr, op: ComparisonOperator, other: &ValueExpr) -> QueryResult<ValueExpr> {
        if let ValueExpr::Function { operand, .. } = other {
            if let Some(field) = operand.field_ref().and_then(|f| self.encrypted(f.name())) {
                return Err(unsupported(field, "a function"));
            }
        }
        match (expr, other) {
            (ValueExpr::Literal(value), ValueExpr::Field(field_ref)) => match self.encrypted(field_ref.name()) {
                Some(field) => Ok(ValueExpr::Literal(self.literal(field, op, value)?)),
                None => Ok(expr.clone()),
            },
            _ => Ok(expr.clone()),
        }
    }

    fn literal(&self, field: &FieldDescriptor, op: ComparisonOperator, value: &Value) -> QueryResult<Value> {
        use ComparisonOperator::*;
        if !matches!(op, Equals | NotEquals | In | NotIn) {
            return Err(unsupported(field, &format!("`{}`", op.sql_token())));
        }
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .iter()
                .map(|item| self.one(field, item))
                .collect::<QueryResult<Vec<_>>>()
                .map(Value::List),
            other => self.one(field, other),
        }
    }

    fn one(&self, field: &FieldDescriptor, value: &Value) -> QueryResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.encryptor
            .encrypt(self.entity.name(), field, value)
            .map_err(|e| e.with_entity(self.entity.name()).with_field(field.name()))
    }

    fn encrypted(&self, name: &str) -> Option<&FieldDescriptor> {
        self.entity.field(name).filter(|f| f.encrypt).map(|f| &**f)
    }
}

fn unsupported(field: &FieldDescriptor, what: &str) -> QueryError {
    QueryError::unsupported(format!(
        "encrypted field `{}` cannot be compared with {}",
        field.name(),
        what
    ))
    .with_field(field.name())
    .with_help("encrypted fields support only =, <>, IN and NOT IN against literal values")
}
