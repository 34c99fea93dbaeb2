//! The condition tree.
//!
//! Conditions are plain values built through the factory functions on
//! [`Condition`] and consumed by two interpreters: the SQL compiler
//! ([`compile`](crate::compile::compile)) and the in-memory matcher
//! ([`matches`](crate::matcher::matches)).
//!
//! ```rust
//! use quarry_query::{Condition, ComparisonOperator};
//!
//! let active_adults = Condition::and([
//!     Condition::eq("status", "ACTIVE"),
//!     Condition::compare("age", ComparisonOperator::GreaterThan, 18),
//! ]);
//! assert_eq!(active_adults.to_string(), "(status = 'ACTIVE' AND age > 18)");
//!
//! let frozen = active_adults.freeze();
//! assert_eq!(*frozen, active_adults);
//! ```

mod expr;
mod frozen;

pub use expr::{FieldRef, Function, ValueExpr};
pub use frozen::FrozenCondition;

use std::fmt;

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::operator::{ComparisonOperator, JoinOperator, OperatorRegistry};
use crate::value::Value;

/// A query predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// `lhs op rhs`
    Comparison {
        /// Left operand.
        lhs: ValueExpr,
        /// Operator.
        op: ComparisonOperator,
        /// Right operand.
        rhs: ValueExpr,
    },
    /// Operands combined with `AND` or `OR`.
    Join {
        /// Join operator.
        op: JoinOperator,
        /// Operands, evaluated left to right.
        operands: Vec<Condition>,
    },
    /// Shorthand for comparing each named field with a value.
    FieldMap {
        /// Field name to value, in order.
        pairs: IndexMap<SmolStr, Value>,
        /// Operator applied to each pair.
        compare_op: ComparisonOperator,
        /// Operator combining the pairs.
        join_op: JoinOperator,
    },
    /// Negation.
    Not {
        /// The negated condition.
        inner: Box<Condition>,
    },
    /// Records effective at a moment: `from <= moment < thru`, open-ended on null.
    DateRange {
        /// Field holding the start of the range.
        from_field: SmolStr,
        /// Field holding the end of the range.
        thru_field: SmolStr,
        /// Fixed moment; the current local time when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        moment: Option<NaiveDateTime>,
    },
    /// SQL passed through verbatim.
    Raw {
        /// The SQL text.
        text: String,
    },
}

impl Condition {
    // ============== Comparisons ==============

    /// Compare a field with a literal.
    pub fn compare(field: impl Into<FieldRef>, op: ComparisonOperator, value: impl Into<Value>) -> Self {
        Self::Comparison {
            lhs: ValueExpr::Field(field.into()),
            op,
            rhs: ValueExpr::Literal(value.into()),
        }
    }

    /// Compare two arbitrary operands.
    pub fn compare_expr(lhs: impl Into<ValueExpr>, op: ComparisonOperator, rhs: impl Into<ValueExpr>) -> Self {
        Self::Comparison {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    /// Compare two fields.
    pub fn compare_fields(lhs: impl Into<FieldRef>, op: ComparisonOperator, rhs: impl Into<FieldRef>) -> Self {
        Self::Comparison {
            lhs: ValueExpr::Field(lhs.into()),
            op,
            rhs: ValueExpr::Field(rhs.into()),
        }
    }

    /// Compare a field with a literal, naming the operator by any registered alias.
    pub fn compare_named(field: impl Into<FieldRef>, op: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let op = OperatorRegistry::global()
            .lookup_comparison(op)
            .ok_or_else(|| QueryError::unknown_operator(op))?;
        Ok(Self::compare(field, op, value))
    }

    /// Case-insensitive comparison: the field is wrapped in `UPPER` and
    /// string literals are upper-cased.
    pub fn compare_ignore_case(field: impl Into<FieldRef>, op: ComparisonOperator, value: impl Into<Value>) -> Self {
        Self::Comparison {
            lhs: ValueExpr::upper(field.into()),
            op,
            rhs: ValueExpr::Literal(upper_literal(value.into())),
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::Equals, value)
    }

    /// `field <> value`
    pub fn ne(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::NotEquals, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::LessThan, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::GreaterThan, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::LessThanEqualTo, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOperator::GreaterThanEqualTo, value)
    }

    /// `field LIKE pattern`
    pub fn like(field: impl Into<FieldRef>, pattern: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOperator::Like, Value::String(pattern.into()))
    }

    /// `field NOT LIKE pattern`
    pub fn not_like(field: impl Into<FieldRef>, pattern: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOperator::NotLike, Value::String(pattern.into()))
    }

    /// `field IN (values)`
    pub fn in_list<V: Into<Value>>(field: impl Into<FieldRef>, values: impl IntoIterator<Item = V>) -> Self {
        Self::compare(field, ComparisonOperator::In, list(values))
    }

    /// `field NOT IN (values)`
    pub fn not_in<V: Into<Value>>(field: impl Into<FieldRef>, values: impl IntoIterator<Item = V>) -> Self {
        Self::compare(field, ComparisonOperator::NotIn, list(values))
    }

    /// `field BETWEEN low AND high`
    pub fn between(field: impl Into<FieldRef>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::compare(
            field,
            ComparisonOperator::Between,
            Value::List(vec![low.into(), high.into()]),
        )
    }

    // ============== Composition ==============

    /// Operands combined with `AND`.
    pub fn and(operands: impl IntoIterator<Item = Condition>) -> Self {
        Self::join(JoinOperator::And, operands)
    }

    /// Operands combined with `OR`.
    pub fn or(operands: impl IntoIterator<Item = Condition>) -> Self {
        Self::join(JoinOperator::Or, operands)
    }

    /// Operands combined with `op`.
    pub fn join(op: JoinOperator, operands: impl IntoIterator<Item = Condition>) -> Self {
        Self::Join {
            op,
            operands: operands.into_iter().collect(),
        }
    }

    /// Every field equal to its value.
    pub fn field_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<SmolStr>,
        V: Into<Value>,
    {
        Self::field_map_with(pairs, ComparisonOperator::Equals, JoinOperator::And)
    }

    /// Every field compared with its value by `compare_op`, combined by `join_op`.
    pub fn field_map_with<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
        compare_op: ComparisonOperator,
        join_op: JoinOperator,
    ) -> Self
    where
        K: Into<SmolStr>,
        V: Into<Value>,
    {
        Self::FieldMap {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            compare_op,
            join_op,
        }
    }

    /// Negate a condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Condition) -> Self {
        Self::Not {
            inner: Box::new(inner),
        }
    }

    /// Records effective now.
    pub fn date_range(from_field: impl Into<SmolStr>, thru_field: impl Into<SmolStr>) -> Self {
        Self::DateRange {
            from_field: from_field.into(),
            thru_field: thru_field.into(),
            moment: None,
        }
    }

    /// Records effective at `moment`.
    pub fn date_range_at(
        from_field: impl Into<SmolStr>,
        thru_field: impl Into<SmolStr>,
        moment: NaiveDateTime,
    ) -> Self {
        Self::DateRange {
            from_field: from_field.into(),
            thru_field: thru_field.into(),
            moment: Some(moment),
        }
    }

    /// Raw SQL, not validated and not supported in memory.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw { text: text.into() }
    }

    // ============== Inspection ==============

    /// Whether the condition constrains nothing.
    ///
    /// Empty conditions compile to no SQL and are skipped inside joins.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Join { operands, .. } => operands.iter().all(Condition::is_empty),
            Self::FieldMap { pairs, .. } => pairs.is_empty(),
            Self::Not { inner } => inner.is_empty(),
            Self::Raw { text } => text.trim().is_empty(),
            Self::Comparison { .. } | Self::DateRange { .. } => false,
        }
    }

    /// Freeze into a shareable, immutable condition.
    pub fn freeze(&self) -> FrozenCondition {
        FrozenCondition::from(self.clone())
    }

    /// Rewrite sugar nodes into the comparisons and joins they stand for.
    ///
    /// Returns `None` for nodes that are already primitive.
    pub fn expand(&self) -> Option<Condition> {
        match self {
            Self::FieldMap {
                pairs,
                compare_op,
                join_op,
            } => Some(Self::Join {
                op: *join_op,
                operands: pairs
                    .iter()
                    .map(|(name, value)| Self::compare(name, *compare_op, value.clone()))
                    .collect(),
            }),
            Self::DateRange {
                from_field,
                thru_field,
                moment,
            } => {
                let moment = moment.unwrap_or_else(|| Local::now().naive_local());
                Some(Self::and([
                    Self::or([
                        Self::eq(thru_field, Value::Null),
                        Self::gt(thru_field, moment),
                    ]),
                    Self::or([
                        Self::eq(from_field, Value::Null),
                        Self::le(from_field, moment),
                    ]),
                ]))
            }
            _ => None,
        }
    }
}

fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Value {
    Value::List(values.into_iter().map(Into::into).collect())
}

fn upper_literal(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        Value::List(items) => Value::List(items.into_iter().map(upper_literal).collect()),
        other => other,
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::not(self)
    }
}

impl fmt::Display for Condition {
    /// Diagnostic rendering with literals inlined. Not valid for execution.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison { lhs, op, rhs } => match (op, rhs) {
                (ComparisonOperator::Equals, ValueExpr::Literal(Value::Null)) => write!(f, "{} IS NULL", lhs),
                (ComparisonOperator::NotEquals, ValueExpr::Literal(Value::Null)) => {
                    write!(f, "{} IS NOT NULL", lhs)
                }
                (ComparisonOperator::Between, ValueExpr::Literal(Value::List(items))) if items.len() == 2 => {
                    write!(f, "{} BETWEEN {} AND {}", lhs, items[0], items[1])
                }
                _ => write!(f, "{} {} {}", lhs, op, rhs),
            },
            Self::Join { op, operands } => {
                let parts: Vec<String> = operands
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(ToString::to_string)
                    .collect();
                match parts.len() {
                    0 => Ok(()),
                    1 => f.write_str(&parts[0]),
                    _ => write!(f, "({})", parts.join(&format!(" {} ", op))),
                }
            }
            Self::FieldMap { .. } => match self.expand() {
                Some(expanded) => expanded.fmt(f),
                None => Ok(()),
            },
            Self::Not { inner } if inner.is_empty() => Ok(()),
            Self::Not { inner } => write!(f, "NOT ({})", inner),
            Self::DateRange {
                from_field,
                thru_field,
                moment,
            } => {
                let at = match moment {
                    Some(moment) => format!("'{}'", moment),
                    None => "CURRENT_TIMESTAMP".to_string(),
                };
                write!(
                    f,
                    "(({thru} IS NULL OR {thru} > {at}) AND ({from} IS NULL OR {from} <= {at}))",
                    thru = thru_field,
                    from = from_field,
                    at = at
                )
            }
            Self::Raw { text } => f.write_str(text),
        }
    }
}
