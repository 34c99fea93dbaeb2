//! Comparison and join operators and the alias registry.
//!
//! Every comparison operator carries both halves of its semantics: the SQL
//! token the compiler emits and the in-memory [`compare`](ComparisonOperator::compare)
//! used by the matcher. Null handling is shared by both:
//!
//! | lhs / rhs      | `=`   | `<>`  | `<` `>` `<=` `>=` |
//! |----------------|-------|-------|-------------------|
//! | null / null    | true  | false | false             |
//! | null / value   | false | true  | false             |
//! | value / null   | false | true  | false             |
//!
//! `IN` and `NOT IN` test membership with the same equality, so a null
//! left-hand side is only `IN` a list that contains null.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::compare::{compare_values, values_equal};
use crate::error::{QueryError, QueryResult};
use crate::like::like_matches;
use crate::value::Value;
use quarry_schema::ValueType;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonOperator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanEqualTo,
    /// `>=`
    GreaterThanEqualTo,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `BETWEEN`
    Between,
}

impl ComparisonOperator {
    /// All comparison operators.
    pub const ALL: [ComparisonOperator; 11] = [
        Self::Equals,
        Self::NotEquals,
        Self::LessThan,
        Self::GreaterThan,
        Self::LessThanEqualTo,
        Self::GreaterThanEqualTo,
        Self::Like,
        Self::NotLike,
        Self::In,
        Self::NotIn,
        Self::Between,
    ];

    /// Canonical identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not-equal",
            Self::LessThan => "less-than",
            Self::GreaterThan => "greater-than",
            Self::LessThanEqualTo => "less-than-equal-to",
            Self::GreaterThanEqualTo => "greater-than-equal-to",
            Self::Like => "like",
            Self::NotLike => "not-like",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Between => "between",
        }
    }

    /// The SQL token emitted between the operands.
    pub fn sql_token(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEqualTo => "<=",
            Self::GreaterThanEqualTo => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
        }
    }

    /// `<`, `>`, `<=` or `>=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::GreaterThan | Self::LessThanEqualTo | Self::GreaterThanEqualTo
        )
    }

    /// Operators whose right-hand side is a collection.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Between)
    }

    /// `LIKE` or `NOT LIKE`.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }

    /// Evaluate the operator against two runtime values.
    ///
    /// Only a malformed `BETWEEN` operand fails; every data-dependent case
    /// yields a boolean.
    pub fn compare(&self, lhs: &Value, rhs: &Value) -> QueryResult<bool> {
        let result = match self {
            Self::Equals => values_equal(lhs, rhs),
            Self::NotEquals => !values_equal(lhs, rhs),
            Self::LessThan => ordered(lhs, rhs, |o| o.is_lt()),
            Self::GreaterThan => ordered(lhs, rhs, |o| o.is_gt()),
            Self::LessThanEqualTo => ordered(lhs, rhs, |o| o.is_le()),
            Self::GreaterThanEqualTo => ordered(lhs, rhs, |o| o.is_ge()),
            Self::Like => pattern_match(lhs, rhs)?.unwrap_or(false),
            Self::NotLike => pattern_match(lhs, rhs)?.map(|m| !m).unwrap_or(false),
            Self::In => in_list(lhs, rhs),
            Self::NotIn => !in_list(lhs, rhs),
            Self::Between => {
                let (low, high) = between_bounds(rhs)?;
                ordered(lhs, low, |o| o.is_ge()) && ordered(lhs, high, |o| o.is_le())
            }
        };
        Ok(result)
    }
}

fn ordered(lhs: &Value, rhs: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    compare_values(lhs, rhs).map(test).unwrap_or(false)
}

/// `None` when either side is null; non-text operands are read as text.
fn pattern_match(lhs: &Value, rhs: &Value) -> QueryResult<Option<bool>> {
    let (Some(text), Some(pattern)) = (as_text(lhs), as_text(rhs)) else {
        return Ok(None);
    };
    like_matches(&pattern, &text).map(Some)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => match coerce(other.clone(), ValueType::String, None, None, true) {
            Ok(Value::String(s)) => Some(s),
            _ => None,
        },
    }
}

fn in_list(lhs: &Value, rhs: &Value) -> bool {
    match rhs {
        Value::List(items) => items.iter().any(|item| values_equal(lhs, item)),
        single => values_equal(lhs, single),
    }
}

pub(crate) fn between_bounds(rhs: &Value) -> QueryResult<(&Value, &Value)> {
    match rhs {
        Value::List(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        Value::List(items) => Err(QueryError::operator_arity("BETWEEN", "exactly 2 values", items.len())),
        _ => Err(QueryError::operator_arity("BETWEEN", "exactly 2 values", 1)),
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_token())
    }
}

impl FromStr for ComparisonOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorRegistry::global()
            .lookup_comparison(s)
            .ok_or_else(|| QueryError::unknown_operator(s))
    }
}

/// A join operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinOperator {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl JoinOperator {
    /// Canonical identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// The SQL keyword placed between operands.
    pub fn sql_token(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// The operand value at which evaluation stops.
    pub fn short_circuit_value(&self) -> bool {
        matches!(self, Self::Or)
    }
}

impl fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_token())
    }
}

impl FromStr for JoinOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorRegistry::global()
            .lookup_join(s)
            .ok_or_else(|| QueryError::unknown_operator(s))
    }
}

/// Either kind of operator, as stored in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// A comparison operator.
    Comparison(ComparisonOperator),
    /// A join operator.
    Join(JoinOperator),
}

impl From<ComparisonOperator> for Operator {
    fn from(op: ComparisonOperator) -> Self {
        Self::Comparison(op)
    }
}

impl From<JoinOperator> for Operator {
    fn from(op: JoinOperator) -> Self {
        Self::Join(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(op) => op.fmt(f),
            Self::Join(op) => op.fmt(f),
        }
    }
}

static GLOBAL: LazyLock<OperatorRegistry> = LazyLock::new(OperatorRegistry::builtin);

/// Name and alias table for operators.
///
/// The process-wide registry is built once on first use and never changes;
/// a private registry can be extended with [`register`](Self::register).
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    by_name: HashMap<String, Operator>,
}

impl OperatorRegistry {
    /// The shared built-in registry.
    pub fn global() -> &'static OperatorRegistry {
        &GLOBAL
    }

    /// A registry populated with every built-in spelling.
    pub fn builtin() -> Self {
        use ComparisonOperator as C;

        let mut registry = Self::default();
        let table: &[(C, &[&str])] = &[
            (C::Equals, &["equals", "=", "==", "eq"]),
            (C::NotEquals, &["not-equal", "notEqual", "not-equals", "!=", "<>", "ne"]),
            (C::LessThan, &["less-than", "lessThan", "less", "<", "lt"]),
            (C::GreaterThan, &["greater-than", "greaterThan", "greater", ">", "gt"]),
            (
                C::LessThanEqualTo,
                &["less-than-equal-to", "lessThanEqualTo", "less-equals", "<=", "le", "lte"],
            ),
            (
                C::GreaterThanEqualTo,
                &["greater-than-equal-to", "greaterThanEqualTo", "greater-equals", ">=", "ge", "gte"],
            ),
            (C::Like, &["like"]),
            (C::NotLike, &["not-like", "notLike"]),
            (C::In, &["in"]),
            (C::NotIn, &["not-in", "notIn"]),
            (C::Between, &["between"]),
        ];
        for (op, names) in table {
            for name in *names {
                registry.register(name, *op);
            }
        }
        for name in ["and", "&&"] {
            registry.register(name, JoinOperator::And);
        }
        for name in ["or", "||"] {
            registry.register(name, JoinOperator::Or);
        }
        registry
    }

    /// Register `name` plus its upper/lower-case and `-`/`_`-swapped spellings.
    pub fn register(&mut self, name: &str, operator: impl Into<Operator>) {
        let operator = operator.into();
        let mut spellings = vec![name.to_string(), name.replace('-', "_"), name.replace('_', "-")];
        let cased: Vec<String> = spellings
            .iter()
            .flat_map(|s| [s.to_lowercase(), s.to_uppercase()])
            .collect();
        spellings.extend(cased);
        for spelling in spellings {
            self.by_name.insert(spelling, operator);
        }
    }

    /// Resolve a name or alias. Falls back to a lower-cased lookup.
    pub fn lookup(&self, name: &str) -> Option<Operator> {
        let name = name.trim();
        self.by_name
            .get(name)
            .or_else(|| self.by_name.get(&name.to_lowercase()))
            .copied()
    }

    /// Resolve a comparison operator.
    pub fn lookup_comparison(&self, name: &str) -> Option<ComparisonOperator> {
        match self.lookup(name)? {
            Operator::Comparison(op) => Some(op),
            Operator::Join(_) => None,
        }
    }

    /// Resolve a join operator.
    pub fn lookup_join(&self, name: &str) -> Option<JoinOperator> {
        match self.lookup(name)? {
            Operator::Join(op) => Some(op),
            Operator::Comparison(_) => None,
        }
    }

    /// Number of registered spellings.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Resolve an operator through the global registry.
pub fn lookup(name: &str) -> Option<Operator> {
    OperatorRegistry::global().lookup(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use ComparisonOperator as C;

    #[test]
    fn test_aliases_resolve() {
        for name in ["not-equal", "notEqual", "!=", "<>", "NOT_EQUAL", "not_equal", "NotEqual"] {
            assert_eq!(lookup(name), Some(Operator::Comparison(C::NotEquals)), "{}", name);
        }
        assert_eq!(lookup("GREATER-THAN-EQUAL-TO"), Some(Operator::Comparison(C::GreaterThanEqualTo)));
        assert_eq!(lookup("AND"), Some(Operator::Join(JoinOperator::And)));
        assert_eq!(lookup("nope"), None);
    }

    #[test]
    fn test_every_operator_resolves_by_id() {
        for op in C::ALL {
            assert_eq!(op.id().parse::<C>().unwrap(), op);
        }
        assert!("and".parse::<C>().is_err());
        assert_eq!("or".parse::<JoinOperator>().unwrap(), JoinOperator::Or);
    }

    #[test]
    fn test_private_registration() {
        let mut registry = OperatorRegistry::builtin();
        let before = registry.len();
        registry.register("is_not", C::NotEquals);
        assert!(registry.len() > before);
        assert_eq!(registry.lookup_comparison("is-not"), Some(C::NotEquals));
        assert_eq!(registry.lookup_comparison("IS_NOT"), Some(C::NotEquals));
        assert_eq!(OperatorRegistry::global().lookup("is_not"), None);
    }

    #[test]
    fn test_null_handling_table() {
        let v = Value::Int(5);
        let n = Value::Null;

        assert!(C::Equals.compare(&n, &n).unwrap());
        assert!(!C::NotEquals.compare(&n, &n).unwrap());
        for (lhs, rhs) in [(&n, &v), (&v, &n)] {
            assert!(!C::Equals.compare(lhs, rhs).unwrap());
            assert!(C::NotEquals.compare(lhs, rhs).unwrap());
        }
        for op in [C::LessThan, C::GreaterThan, C::LessThanEqualTo, C::GreaterThanEqualTo] {
            for (lhs, rhs) in [(&n, &n), (&n, &v), (&v, &n)] {
                assert!(!op.compare(lhs, rhs).unwrap(), "{} {:?} {:?}", op, lhs, rhs);
            }
        }
    }

    #[test]
    fn test_in_membership() {
        let list = Value::from(vec![Value::Int(1), Value::Int(2)]);
        assert!(C::In.compare(&Value::Int(2), &list).unwrap());
        assert!(!C::In.compare(&Value::Null, &list).unwrap());
        assert!(C::NotIn.compare(&Value::Null, &list).unwrap());

        let with_null = Value::from(vec![Value::Int(1), Value::Null]);
        assert!(C::In.compare(&Value::Null, &with_null).unwrap());
        assert!(!C::NotIn.compare(&Value::Null, &with_null).unwrap());

        assert!(!C::In.compare(&Value::Int(1), &Value::List(vec![])).unwrap());
        assert!(C::NotIn.compare(&Value::Int(1), &Value::List(vec![])).unwrap());
    }

    #[test]
    fn test_between() {
        let range = Value::from(vec![10, 20]);
        assert!(C::Between.compare(&Value::Int(10), &range).unwrap());
        assert!(C::Between.compare(&Value::Int(20), &range).unwrap());
        assert!(!C::Between.compare(&Value::Int(21), &range).unwrap());
        assert!(!C::Between.compare(&Value::Null, &range).unwrap());

        let err = C::Between.compare(&Value::Int(1), &Value::from(vec![1, 2, 3])).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::OperatorArity);
    }

    #[test]
    fn test_like() {
        assert!(C::Like.compare(&Value::from("John"), &Value::from("J%")).unwrap());
        assert!(!C::NotLike.compare(&Value::from("John"), &Value::from("J%")).unwrap());
        assert!(!C::Like.compare(&Value::Null, &Value::from("%")).unwrap());
        assert!(!C::NotLike.compare(&Value::Null, &Value::from("%")).unwrap());
        assert!(C::Like.compare(&Value::Int(123), &Value::from("12%")).unwrap());
    }

    #[test]
    fn test_join_short_circuit() {
        assert!(!JoinOperator::And.short_circuit_value());
        assert!(JoinOperator::Or.short_circuit_value());
        assert_eq!(JoinOperator::And.to_string(), "AND");
    }
}
