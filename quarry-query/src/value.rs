//! Runtime values held by records and literals.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use quarry_schema::ValueType;

/// A dynamically typed field value.
///
/// Serialization is untagged, so a value read back from JSON comes out as the
/// loosest matching variant (temporals and decimals as strings); run it
/// through [`coerce`](crate::coerce::coerce) to restore the field's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Decimal value.
    Decimal(Decimal),
    /// String value.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    Timestamp(NaiveDateTime),
    /// Binary data.
    Bytes(Vec<u8>),
    /// List of values.
    List(Vec<Value>),
    /// Ordered map of values.
    Map(IndexMap<String, Value>),
    /// JSON value.
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The natural value type of this value. Null reports `Object`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null | Self::Json(_) => ValueType::Object,
            Self::Bool(_) => ValueType::Boolean,
            Self::Int(_) => ValueType::Long,
            Self::Float(_) => ValueType::Double,
            Self::Decimal(_) => ValueType::BigDecimal,
            Self::String(_) => ValueType::String,
            Self::Date(_) => ValueType::Date,
            Self::Time(_) => ValueType::Time,
            Self::Timestamp(_) => ValueType::Timestamp,
            Self::Bytes(_) => ValueType::ByteArray,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
        }
    }

    /// Short name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Json(_) => "Json",
            other => other.value_type().as_str(),
        }
    }

    /// Whether the value can be stored in a field of `target` without conversion.
    ///
    /// Null is an instance of every type.
    pub fn is_instance_of(&self, target: ValueType) -> bool {
        use ValueType as V;

        if target == V::Object {
            return true;
        }
        match self {
            Self::Null => true,
            Self::Bool(_) => target == V::Boolean,
            Self::Int(i) => match target {
                V::Long => true,
                V::Integer => i32::try_from(*i).is_ok(),
                _ => false,
            },
            Self::Float(_) => matches!(target, V::Float | V::Double),
            Self::Decimal(_) => target == V::BigDecimal,
            Self::String(_) => matches!(target, V::String | V::Clob),
            Self::Date(_) => target == V::Date,
            Self::Time(_) => target == V::Time,
            Self::Timestamp(_) => target == V::Timestamp,
            Self::Bytes(_) => matches!(target, V::Blob | V::ByteArray),
            Self::List(_) => target == V::List,
            Self::Map(_) => target == V::Map,
            Self::Json(_) => false,
        }
    }

    /// Uniform emptiness check: null, empty strings, empty collections.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Json(serde_json::Value::Null) => true,
            _ => false,
        }
    }

    /// Borrow the string content.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(d),
            _ => None,
        }
    }

    /// Boolean content.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list elements.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Whether the value is a number of any representation.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Decimal(_))
    }
}

impl fmt::Display for Value {
    /// SQL-literal style rendering, for diagnostics only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Date(d) => write!(f, "'{}'", d),
            Self::Time(t) => write!(f, "'{}'", t),
            Self::Timestamp(ts) => write!(f, "'{}'", ts),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Json(j) => write!(f, "{}", j),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
