//! Value comparison shared by the matcher and in-memory sorting.
//!
//! Numbers of any representation compare numerically. Otherwise the
//! right-hand value is coerced to the left-hand value's type, mirroring
//! how a column's affinity converts a bound parameter. Numeric text with a
//! fractional part is never narrowed to an integer. Values that cannot be
//! brought to a common type are incomparable.

use std::cmp::Ordering;
use std::mem;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::coerce::{coerce, fractional_number};
use crate::value::Value;

/// Null-aware equality: two nulls are equal, a null never equals a value.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => compare_values(lhs, rhs) == Some(Ordering::Equal),
    }
}

/// Order two non-null values. Returns `None` for nulls and incomparable pairs.
pub fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if lhs.is_null() || rhs.is_null() {
        return None;
    }
    if lhs.is_numeric() && rhs.is_numeric() {
        return compare_numbers(lhs, rhs);
    }

    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            let equal = a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y));
            equal.then_some(Ordering::Equal)
        }
        (Value::Map(a), Value::Map(b)) => (a == b).then_some(Ordering::Equal),
        (Value::Json(a), Value::Json(b)) => (a == b).then_some(Ordering::Equal),
        (Value::Int(_), Value::String(_)) => match fractional_number(rhs) {
            Some(number) => compare_numbers(lhs, &number),
            None => compare_coerced(lhs, rhs),
        },
        _ => compare_coerced(lhs, rhs),
    }
}

fn compare_coerced(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    let converted = coerce(rhs.clone(), lhs.value_type(), None, None, true).ok()?;
    if mem::discriminant(&converted) == mem::discriminant(lhs) {
        compare_values(lhs, &converted)
    } else {
        None
    }
}

fn compare_numbers(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            let a = to_decimal(lhs)?;
            let b = to_decimal(rhs)?;
            Some(a.cmp(&b))
        }
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Total order used for sorting: nulls first or last, incomparable values tie.
pub fn sort_order(lhs: &Value, rhs: &Value, nulls_first: bool) -> Ordering {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => compare_values(lhs, rhs).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(compare_values(&Value::Int(2), &Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&Value::Decimal(Decimal::new(150, 2)), &Value::Float(1.5)),
            Some(Ordering::Equal)
        );
        assert!(values_equal(&Value::Int(18), &Value::Float(18.0)));
    }

    #[test]
    fn test_rhs_coerced_to_lhs_type() {
        assert!(values_equal(&Value::Int(18), &Value::from("18")));
        assert_eq!(compare_values(&Value::from("18"), &Value::Int(9)), Some(Ordering::Less));
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(values_equal(&Value::Date(day), &Value::from("2024-03-01")));
    }

    #[test]
    fn test_fractional_text_is_not_truncated() {
        assert!(!values_equal(&Value::Int(18), &Value::from("18.5")));
        assert!(!values_equal(&Value::Int(18), &Value::from("18.7")));
        assert_eq!(compare_values(&Value::Int(18), &Value::from("18.5")), Some(Ordering::Less));
        assert_eq!(compare_values(&Value::Int(19), &Value::from("18.5")), Some(Ordering::Greater));
        assert!(values_equal(&Value::Int(18), &Value::from("18.0")));
    }

    #[test]
    fn test_incomparable() {
        assert_eq!(compare_values(&Value::Int(1), &Value::from("abc")), None);
        assert!(!values_equal(&Value::Int(1), &Value::from("abc")));
        assert_eq!(compare_values(&Value::Float(f64::NAN), &Value::Float(1.0)), None);
    }

    #[test]
    fn test_nulls() {
        assert!(values_equal(&Value::Null, &Value::Null));
        assert!(!values_equal(&Value::Null, &Value::Int(0)));
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
    }

    #[test]
    fn test_strings_compare_bytewise() {
        assert_eq!(compare_values(&Value::from("B"), &Value::from("a")), Some(Ordering::Less));
    }

    #[test]
    fn test_sort_order_nulls() {
        assert_eq!(sort_order(&Value::Null, &Value::Int(1), true), Ordering::Less);
        assert_eq!(sort_order(&Value::Null, &Value::Int(1), false), Ordering::Greater);
        assert_eq!(sort_order(&Value::Int(3), &Value::Int(1), true), Ordering::Greater);
    }
}
