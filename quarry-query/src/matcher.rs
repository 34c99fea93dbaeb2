//! In-memory evaluation of conditions.
//!
//! The matcher applies the same operator semantics as the compiled SQL, so a
//! record matches a condition exactly when the equivalent row would satisfy
//! the compiled WHERE clause. Fields are looked up by logical name; absent
//! fields are null. View aliases on field references are ignored.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use smol_str::SmolStr;

use crate::condition::{Condition, ValueExpr};
use crate::error::{QueryError, QueryResult};
use crate::quarry_trace;
use crate::record::Record;
use crate::value::Value;
use crate::visitor::{walk, ConditionVisitor};

/// Whether `record` satisfies `condition`.
///
/// Fails only for conditions that cannot be evaluated in memory: raw SQL
/// fragments and malformed `BETWEEN` operands.
pub fn matches(condition: &Condition, record: &dyn Record) -> QueryResult<bool> {
    ensure_evaluable(condition)?;
    let result = eval(condition, record)?;
    quarry_trace!(condition = %condition, result, "Evaluated condition in memory");
    Ok(result)
}

impl Condition {
    /// Whether `record` satisfies this condition. See [`matches`].
    pub fn matches(&self, record: &dyn Record) -> QueryResult<bool> {
        matches(self, record)
    }
}

/// Records satisfying `condition`, in their original order.
pub fn filter_records<'a, R: Record>(records: &'a [R], condition: &Condition) -> QueryResult<Vec<&'a R>> {
    ensure_evaluable(condition)?;
    let mut matched = Vec::new();
    for record in records {
        if eval(condition, record)? {
            matched.push(record);
        }
    }
    Ok(matched)
}

/// Records whose fields equal every given value.
pub fn filter_by_and<'a, R, K, V>(
    records: &'a [R],
    fields: impl IntoIterator<Item = (K, V)>,
) -> QueryResult<Vec<&'a R>>
where
    R: Record,
    K: Into<SmolStr>,
    V: Into<Value>,
{
    filter_records(records, &Condition::field_map(fields))
}

/// Records effective at `moment` (now when `None`).
pub fn filter_by_date<'a, R: Record>(
    records: &'a [R],
    from_field: &str,
    thru_field: &str,
    moment: Option<NaiveDateTime>,
) -> QueryResult<Vec<&'a R>> {
    let condition = match moment {
        Some(moment) => Condition::date_range_at(from_field, thru_field, moment),
        None => Condition::date_range(from_field, thru_field),
    };
    filter_records(records, &condition)
}

/// The first record satisfying `condition`.
pub fn first_match<'a, R: Record>(records: &'a [R], condition: &Condition) -> QueryResult<Option<&'a R>> {
    ensure_evaluable(condition)?;
    for record in records {
        if eval(condition, record)? {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

fn eval(condition: &Condition, record: &dyn Record) -> QueryResult<bool> {
    match condition {
        Condition::Comparison { lhs, op, rhs } => {
            let lhs = operand(lhs, record);
            let rhs = operand(rhs, record);
            op.compare(&lhs, &rhs)
        }
        Condition::Join { op, operands } => {
            let stop = op.short_circuit_value();
            let mut evaluated = false;
            for operand in operands.iter().filter(|c| !c.is_empty()) {
                evaluated = true;
                if eval(operand, record)? == stop {
                    return Ok(stop);
                }
            }
            Ok(!evaluated || !stop)
        }
        Condition::FieldMap { .. } | Condition::DateRange { .. } => match condition.expand() {
            Some(expanded) => eval(&expanded, record),
            None => Ok(true),
        },
        Condition::Not { inner } if inner.is_empty() => Ok(true),
        Condition::Not { inner } => Ok(!eval(inner, record)?),
        Condition::Raw { .. } if condition.is_empty() => Ok(true),
        Condition::Raw { .. } => Err(raw_unsupported()),
    }
}

fn operand<'a>(expr: &'a ValueExpr, record: &'a dyn Record) -> Cow<'a, Value> {
    match expr {
        ValueExpr::Field(field) => Cow::Borrowed(record.value(field.name())),
        ValueExpr::Literal(value) => Cow::Borrowed(value),
        ValueExpr::Function { kind, operand: inner } => Cow::Owned(kind.apply(&operand(inner, record))),
    }
}

#[derive(Default)]
struct RawFinder {
    found: bool,
}

impl ConditionVisitor for RawFinder {
    fn visit_raw(&mut self, text: &str) {
        // Blank fragments are empty operands, skipped like everywhere else.
        if !text.trim().is_empty() {
            self.found = true;
        }
    }
}

fn ensure_evaluable(condition: &Condition) -> QueryResult<()> {
    let mut finder = RawFinder::default();
    walk(condition, &mut finder);
    if finder.found {
        Err(raw_unsupported())
    } else {
        Ok(())
    }
}

fn raw_unsupported() -> QueryError {
    QueryError::unsupported("raw SQL fragments cannot be evaluated in memory")
        .with_help("filter with the compiled query instead, or replace the fragment with a comparison")
}
