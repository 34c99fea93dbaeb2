//! Fuzz target for condition compilation and matching.
//!
//! Generates arbitrary condition trees and records, then checks that
//! compiling and matching never panic and that every placeholder has a
//! bound parameter.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_condition
//! ```

#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quarry_query::{ComparisonOperator, Condition, JoinOperator, Value, ValueExpr, compile};
use quarry_schema::{DialectConfig, EntityDescriptor, FieldTypeCatalog, TypeMismatchPolicy, ValueType};

const FIELDS: &[&str] = &["id", "name", "age", "score", "fromDate", "thruDate", "missing"];

#[derive(Debug, Arbitrary, Clone)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<FuzzValue>),
}

impl From<FuzzValue> for Value {
    fn from(val: FuzzValue) -> Self {
        match val {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(b),
            FuzzValue::Int(i) => Value::Int(i),
            FuzzValue::Float(f) => Value::Float(f),
            FuzzValue::String(s) => Value::String(s),
            FuzzValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzOp {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanEqualTo,
    GreaterThanEqualTo,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
}

impl From<FuzzOp> for ComparisonOperator {
    fn from(op: FuzzOp) -> Self {
        match op {
            FuzzOp::Equals => Self::Equals,
            FuzzOp::NotEquals => Self::NotEquals,
            FuzzOp::LessThan => Self::LessThan,
            FuzzOp::GreaterThan => Self::GreaterThan,
            FuzzOp::LessThanEqualTo => Self::LessThanEqualTo,
            FuzzOp::GreaterThanEqualTo => Self::GreaterThanEqualTo,
            FuzzOp::Like => Self::Like,
            FuzzOp::NotLike => Self::NotLike,
            FuzzOp::In => Self::In,
            FuzzOp::NotIn => Self::NotIn,
            FuzzOp::Between => Self::Between,
        }
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzCondition {
    Compare { field: u8, op: FuzzOp, value: FuzzValue },
    CompareLiteralFirst { value: FuzzValue, op: FuzzOp, field: u8 },
    CompareFields { left: u8, op: FuzzOp, right: u8 },
    And(Vec<FuzzCondition>),
    Or(Vec<FuzzCondition>),
    Not(Box<FuzzCondition>),
    FieldMap { pairs: Vec<(u8, FuzzValue)>, op: FuzzOp, or: bool },
    DateRange,
}

fn field(index: u8) -> &'static str {
    FIELDS[index as usize % FIELDS.len()]
}

impl FuzzCondition {
    fn build(self, depth: usize) -> Condition {
        if depth > 8 {
            return Condition::and([]);
        }
        match self {
            Self::Compare { field: f, op, value } => Condition::compare(field(f), op.into(), Value::from(value)),
            Self::CompareLiteralFirst { value, op, field: f } => Condition::compare_expr(
                ValueExpr::literal(Value::from(value)),
                op.into(),
                ValueExpr::field(field(f)),
            ),
            Self::CompareFields { left, op, right } => Condition::compare_fields(field(left), op.into(), field(right)),
            Self::And(items) => Condition::and(items.into_iter().map(|c| c.build(depth + 1))),
            Self::Or(items) => Condition::or(items.into_iter().map(|c| c.build(depth + 1))),
            Self::Not(inner) => Condition::not(inner.build(depth + 1)),
            Self::FieldMap { pairs, op, or } => Condition::field_map_with(
                pairs.into_iter().map(|(f, v)| (field(f), Value::from(v))),
                op.into(),
                if or { JoinOperator::Or } else { JoinOperator::And },
            ),
            Self::DateRange => Condition::date_range("fromDate", "thruDate"),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    condition: FuzzCondition,
    record: Vec<(u8, FuzzValue)>,
    dollar: bool,
    warn: bool,
}

fuzz_target!(|input: Input| {
    let Ok(entity) = EntityDescriptor::builder("Sample")
        .typed_field("id", ValueType::Long)
        .typed_field("name", ValueType::String)
        .typed_field("age", ValueType::Integer)
        .typed_field("score", ValueType::Double)
        .typed_field("fromDate", ValueType::Timestamp)
        .typed_field("thruDate", ValueType::Timestamp)
        .build(FieldTypeCatalog::builtin())
    else {
        return;
    };

    let mut dialect = if input.dollar { DialectConfig::postgres() } else { DialectConfig::sqlite() };
    if input.warn {
        dialect = dialect.with_type_mismatch(TypeMismatchPolicy::Warn);
    }

    let condition = input.condition.build(0);

    // Compilation may reject the tree but must never panic.
    if let Ok(compiled) = compile(&condition, &entity, &dialect) {
        assert_eq!(compiled.placeholder_count(), compiled.params.len());
    }

    let record: HashMap<String, Value> = input
        .record
        .into_iter()
        .map(|(f, v)| (field(f).to_string(), Value::from(v)))
        .collect();
    let _ = condition.matches(&record);

    let frozen = condition.freeze();
    assert!(frozen.freeze().ptr_eq(&frozen));
    let _ = frozen.to_string();
});
