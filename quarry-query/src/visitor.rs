//! Read-only traversal of condition trees.
//!
//! [`walk`] visits nodes left to right and the left operand before the
//! right, the same order in which the compiler binds parameters.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::condition::{Condition, FieldRef, Function, ValueExpr};
use crate::operator::{ComparisonOperator, JoinOperator};
use crate::value::Value;

/// Callbacks invoked by [`walk`]. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait ConditionVisitor {
    /// A comparison node, before its operands.
    fn visit_comparison(&mut self, lhs: &ValueExpr, op: ComparisonOperator, rhs: &ValueExpr) {}

    /// A join node, before its operands.
    fn enter_join(&mut self, op: JoinOperator, operands: &[Condition]) {}

    /// A join node, after its operands.
    fn leave_join(&mut self, op: JoinOperator) {}

    /// A field map, before its pairs.
    fn visit_field_map(
        &mut self,
        pairs: &IndexMap<SmolStr, Value>,
        compare_op: ComparisonOperator,
        join_op: JoinOperator,
    ) {
    }

    /// A negation, before its inner condition.
    fn enter_not(&mut self, inner: &Condition) {}

    /// A negation, after its inner condition.
    fn leave_not(&mut self) {}

    /// A date range, before its fields.
    fn visit_date_range(&mut self, from_field: &str, thru_field: &str, moment: Option<NaiveDateTime>) {}

    /// A raw fragment.
    fn visit_raw(&mut self, text: &str) {}

    /// A field reference.
    fn visit_field(&mut self, field: &FieldRef) {}

    /// A literal value.
    fn visit_literal(&mut self, value: &Value) {}

    /// A function, before its operand.
    fn visit_function(&mut self, function: Function) {}
}

/// Visit every node of `condition`.
pub fn walk<V: ConditionVisitor + ?Sized>(condition: &Condition, visitor: &mut V) {
    match condition {
        Condition::Comparison { lhs, op, rhs } => {
            visitor.visit_comparison(lhs, *op, rhs);
            walk_expr(lhs, visitor);
            walk_expr(rhs, visitor);
        }
        Condition::Join { op, operands } => {
            visitor.enter_join(*op, operands);
            for operand in operands {
                walk(operand, visitor);
            }
            visitor.leave_join(*op);
        }
        Condition::FieldMap {
            pairs,
            compare_op,
            join_op,
        } => {
            visitor.visit_field_map(pairs, *compare_op, *join_op);
            for (name, value) in pairs {
                visitor.visit_field(&FieldRef::new(name.clone()));
                visitor.visit_literal(value);
            }
        }
        Condition::Not { inner } => {
            visitor.enter_not(inner);
            walk(inner, visitor);
            visitor.leave_not();
        }
        Condition::DateRange {
            from_field,
            thru_field,
            moment,
        } => {
            visitor.visit_date_range(from_field, thru_field, *moment);
            visitor.visit_field(&FieldRef::new(thru_field.clone()));
            visitor.visit_field(&FieldRef::new(from_field.clone()));
        }
        Condition::Raw { text } => visitor.visit_raw(text),
    }
}

/// Visit an operand.
pub fn walk_expr<V: ConditionVisitor + ?Sized>(expr: &ValueExpr, visitor: &mut V) {
    match expr {
        ValueExpr::Field(field) => visitor.visit_field(field),
        ValueExpr::Literal(value) => visitor.visit_literal(value),
        ValueExpr::Function { kind, operand } => {
            visitor.visit_function(*kind);
            walk_expr(operand, visitor);
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<FieldRef>,
}

impl ConditionVisitor for FieldCollector {
    fn visit_field(&mut self, field: &FieldRef) {
        if !self.fields.contains(field) {
            self.fields.push(field.clone());
        }
    }
}

/// Every distinct field referenced by `condition`, in first-seen order.
pub fn referenced_fields(condition: &Condition) -> Vec<FieldRef> {
    let mut collector = FieldCollector::default();
    walk(condition, &mut collector);
    collector.fields
}

impl Condition {
    /// Every distinct field referenced, in first-seen order.
    pub fn referenced_fields(&self) -> Vec<FieldRef> {
        referenced_fields(self)
    }
}
