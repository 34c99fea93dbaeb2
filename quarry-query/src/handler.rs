//! Value handlers: binding values into statement slots and extracting them
//! from result columns.
//!
//! Drivers implement [`ParamSink`] for their statements and [`ColumnSource`]
//! for their rows. A [`ValueHandler`] is chosen per field from its declared
//! value type and native column type through the [`HandlerRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rust_decimal::Decimal;

use quarry_schema::{FieldDescriptor, ValueType};

use crate::coerce::{parse_timestamp, to_epoch_millis};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Storage class of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// SQL NULL.
    Null,
    /// Integer storage.
    Integer,
    /// Floating point storage.
    Real,
    /// Character storage.
    Text,
    /// Binary storage.
    Blob,
}

/// A parameterized statement accepting positional binds. Indexes are 1-based.
pub trait ParamSink {
    /// Bind SQL NULL.
    fn bind_null(&mut self, index: usize) -> QueryResult<()>;

    /// Bind a boolean.
    fn bind_bool(&mut self, index: usize, value: bool) -> QueryResult<()>;

    /// Bind a 64-bit integer.
    fn bind_i64(&mut self, index: usize, value: i64) -> QueryResult<()>;

    /// Bind a double.
    fn bind_f64(&mut self, index: usize, value: f64) -> QueryResult<()>;

    /// Bind character data.
    fn bind_text(&mut self, index: usize, value: &str) -> QueryResult<()>;

    /// Bind binary data.
    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> QueryResult<()>;
}

/// A result row read by column position. Indexes are 0-based.
pub trait ColumnSource {
    /// Storage class of the column.
    fn column_kind(&self, index: usize) -> QueryResult<ColumnKind>;

    /// Read an integer column.
    fn get_i64(&self, index: usize) -> QueryResult<i64>;

    /// Read a floating point column.
    fn get_f64(&self, index: usize) -> QueryResult<f64>;

    /// Read a column as text.
    fn get_text(&self, index: usize) -> QueryResult<String>;

    /// Read a binary column.
    fn get_bytes(&self, index: usize) -> QueryResult<Vec<u8>>;

    /// Read a boolean column.
    fn get_bool(&self, index: usize) -> QueryResult<bool> {
        self.get_i64(index).map(|v| v != 0)
    }

    /// Check for SQL NULL.
    fn is_null(&self, index: usize) -> QueryResult<bool> {
        self.column_kind(index).map(|k| k == ColumnKind::Null)
    }
}

/// Strategy for moving one value type in and out of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueHandler {
    /// Variable length character data.
    String,
    /// Blank padded `CHAR(n)`; trailing padding is dropped on extract.
    FixedChar,
    /// Character large object; also read from binary storage.
    Clob,
    /// Boolean flag.
    Boolean,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Floating point.
    Double,
    /// Decimal, bound as text to keep precision.
    BigDecimal,
    /// Date as ISO text.
    Date,
    /// Time as ISO text.
    Time,
    /// Timestamp as ISO text; integer storage is read as epoch millis.
    Timestamp,
    /// Binary data.
    Bytes,
    /// Anything else, bound as JSON text.
    Object,
}

impl ValueHandler {
    /// Handler name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::FixedChar => "FixedChar",
            Self::Clob => "Clob",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::BigDecimal => "BigDecimal",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Timestamp => "Timestamp",
            Self::Bytes => "Bytes",
            Self::Object => "Object",
        }
    }

    /// The handler a value would use on its own.
    pub fn natural(value: &Value) -> Self {
        match value {
            Value::Null | Value::List(_) | Value::Map(_) | Value::Json(_) => Self::Object,
            Value::Bool(_) => Self::Boolean,
            Value::Int(_) => Self::Long,
            Value::Float(_) => Self::Double,
            Value::Decimal(_) => Self::BigDecimal,
            Value::String(_) => Self::String,
            Value::Date(_) => Self::Date,
            Value::Time(_) => Self::Time,
            Value::Timestamp(_) => Self::Timestamp,
            Value::Bytes(_) => Self::Bytes,
        }
    }

    /// Bind `value` at `index`.
    pub fn bind(&self, sink: &mut dyn ParamSink, index: usize, value: &Value) -> QueryResult<()> {
        if value.is_null() {
            return sink.bind_null(index);
        }

        match (self, value) {
            (Self::String | Self::FixedChar | Self::Clob, Value::String(s)) => sink.bind_text(index, s),
            (Self::Boolean, Value::Bool(b)) => sink.bind_bool(index, *b),
            (Self::Integer, Value::Int(i)) => {
                if i32::try_from(*i).is_err() {
                    return Err(QueryError::bind_failed(index, format!("{} is out of range for Integer", i)));
                }
                sink.bind_i64(index, *i)
            }
            (Self::Long, Value::Int(i)) => sink.bind_i64(index, *i),
            (Self::Double, Value::Float(f)) => sink.bind_f64(index, *f),
            (Self::Double, Value::Int(i)) => sink.bind_f64(index, *i as f64),
            (Self::BigDecimal, Value::Decimal(d)) => sink.bind_text(index, &d.to_string()),
            (Self::BigDecimal, Value::Int(i)) => sink.bind_text(index, &i.to_string()),
            (Self::Date, Value::Date(d)) => sink.bind_text(index, &d.format("%Y-%m-%d").to_string()),
            (Self::Time, Value::Time(t)) => sink.bind_text(index, &t.format("%H:%M:%S%.f").to_string()),
            (Self::Timestamp, Value::Timestamp(ts)) => {
                sink.bind_text(index, &ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            (Self::Bytes, Value::Bytes(b)) => sink.bind_bytes(index, b),
            (Self::Object, other) => {
                let json = serde_json::to_string(other)
                    .map_err(|e| QueryError::bind_failed(index, e.to_string()))?;
                sink.bind_text(index, &json)
            }
            (handler, other) => Err(QueryError::bind_failed(
                index,
                format!("{} handler cannot bind a {} value", handler, other.type_name()),
            )),
        }
    }

    /// Extract the value at column `index`.
    pub fn extract(&self, source: &dyn ColumnSource, index: usize) -> QueryResult<Value> {
        let kind = source.column_kind(index)?;
        if kind == ColumnKind::Null {
            return Ok(Value::Null);
        }

        let value = match self {
            Self::String => Value::String(source.get_text(index)?),
            Self::FixedChar => {
                let mut text = source.get_text(index)?;
                text.truncate(text.trim_end_matches(' ').len());
                Value::String(text)
            }
            Self::Clob => match kind {
                ColumnKind::Blob => {
                    let bytes = source.get_bytes(index)?;
                    Value::String(
                        String::from_utf8(bytes).map_err(|e| QueryError::extract_failed(index, e.to_string()))?,
                    )
                }
                _ => Value::String(source.get_text(index)?),
            },
            Self::Boolean => match kind {
                ColumnKind::Text => {
                    let text = source.get_text(index)?;
                    Value::Bool(matches!(text.trim(), "1" | "Y" | "y" | "T" | "t" | "true" | "TRUE"))
                }
                _ => Value::Bool(source.get_bool(index)?),
            },
            Self::Integer => {
                let i = source.get_i64(index)?;
                if i32::try_from(i).is_err() {
                    return Err(QueryError::extract_failed(index, format!("{} is out of range for Integer", i)));
                }
                Value::Int(i)
            }
            Self::Long => Value::Int(source.get_i64(index)?),
            Self::Double => Value::Float(source.get_f64(index)?),
            Self::BigDecimal => {
                let text = source.get_text(index)?;
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Value::Decimal)
                    .map_err(|e| QueryError::extract_failed(index, e.to_string()))?
            }
            Self::Date => Value::Date(self.read_timestamp(source, index, kind)?.date()),
            Self::Time => {
                let text = source.get_text(index)?;
                chrono::NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
                    .map(Value::Time)
                    .map_err(|e| QueryError::extract_failed(index, e.to_string()))?
            }
            Self::Timestamp => Value::Timestamp(self.read_timestamp(source, index, kind)?),
            Self::Bytes => Value::Bytes(source.get_bytes(index)?),
            Self::Object => {
                let text = source.get_text(index)?;
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            }
        };
        Ok(value)
    }

    fn read_timestamp(
        &self,
        source: &dyn ColumnSource,
        index: usize,
        kind: ColumnKind,
    ) -> QueryResult<chrono::NaiveDateTime> {
        match kind {
            ColumnKind::Integer => {
                let millis = source.get_i64(index)?;
                chrono::DateTime::from_timestamp_millis(millis)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| QueryError::extract_failed(index, format!("{} is out of range", millis)))
            }
            _ => {
                let text = source.get_text(index)?;
                parse_timestamp(&text, None).map_err(|e| QueryError::extract_failed(index, e))
            }
        }
    }

    /// Epoch millis of a timestamp value, as some drivers store them.
    pub fn timestamp_millis(value: &Value) -> Option<i64> {
        match value {
            Value::Timestamp(ts) => Some(to_epoch_millis(ts)),
            _ => None,
        }
    }
}

impl fmt::Display for ValueHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler lookup by value type and native column type.
#[derive(Debug)]
pub struct HandlerRegistry {
    by_type: HashMap<ValueType, ValueHandler>,
    by_sql_type: HashMap<ValueType, HashMap<&'static str, ValueHandler>>,
}

static REGISTRY: LazyLock<HandlerRegistry> = LazyLock::new(HandlerRegistry::build);

impl HandlerRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static HandlerRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        use ValueHandler as H;
        use ValueType as V;

        let by_type = HashMap::from([
            (V::String, H::String),
            (V::Clob, H::Clob),
            (V::Boolean, H::Boolean),
            (V::Integer, H::Integer),
            (V::Long, H::Long),
            (V::Float, H::Double),
            (V::Double, H::Double),
            (V::BigDecimal, H::BigDecimal),
            (V::Date, H::Date),
            (V::Time, H::Time),
            (V::Timestamp, H::Timestamp),
            (V::Blob, H::Bytes),
            (V::ByteArray, H::Bytes),
            (V::Object, H::Object),
            (V::List, H::Object),
            (V::Map, H::Object),
        ]);

        let overrides: &[(ValueType, &'static str, ValueHandler)] = &[
            (V::String, "CHAR", H::FixedChar),
            (V::String, "CHARACTER", H::FixedChar),
            (V::String, "NCHAR", H::FixedChar),
            (V::String, "CLOB", H::Clob),
            (V::String, "NCLOB", H::Clob),
            (V::String, "TEXT", H::Clob),
            (V::String, "MEDIUMTEXT", H::Clob),
            (V::String, "LONGTEXT", H::Clob),
            (V::Clob, "VARCHAR", H::String),
            (V::Integer, "BIGINT", H::Long),
        ];
        let mut by_sql_type: HashMap<ValueType, HashMap<&'static str, ValueHandler>> = HashMap::new();
        for (value_type, sql_type, handler) in overrides {
            by_sql_type
                .entry(*value_type)
                .or_default()
                .insert(*sql_type, *handler);
        }

        tracing::debug!(
            types = by_type.len(),
            overrides = overrides.len(),
            "Initialized value handler registry"
        );

        Self { by_type, by_sql_type }
    }

    /// Handler for a value type stored in a native column type.
    pub fn get(&self, value_type: ValueType, sql_type: &str) -> ValueHandler {
        self.native_override(value_type, sql_type)
            .or_else(|| self.by_type.get(&value_type).copied())
            .unwrap_or(ValueHandler::Object)
    }

    /// Handler for a field, honoring its alternate native type.
    pub fn for_field(&self, field: &FieldDescriptor) -> ValueHandler {
        let value_type = field.value_type();
        let alias = field.field_type.sql_type_alias.as_deref();
        self.native_override(value_type, &field.field_type.sql_type)
            .or_else(|| alias.and_then(|a| self.native_override(value_type, a)))
            .unwrap_or_else(|| self.get(value_type, ""))
    }

    fn native_override(&self, value_type: ValueType, sql_type: &str) -> Option<ValueHandler> {
        let base = base_type(sql_type);
        self.by_sql_type
            .get(&value_type)
            .and_then(|natives| natives.get(base.as_str()))
            .copied()
    }
}

fn base_type(sql_type: &str) -> String {
    let end = sql_type.find('(').unwrap_or(sql_type.len());
    sql_type[..end].trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quarry_schema::FieldType;

    #[derive(Default)]
    struct Recorder {
        binds: Vec<(usize, String)>,
    }

    impl ParamSink for Recorder {
        fn bind_null(&mut self, index: usize) -> QueryResult<()> {
            self.binds.push((index, "NULL".into()));
            Ok(())
        }
        fn bind_bool(&mut self, index: usize, value: bool) -> QueryResult<()> {
            self.binds.push((index, format!("bool:{}", value)));
            Ok(())
        }
        fn bind_i64(&mut self, index: usize, value: i64) -> QueryResult<()> {
            self.binds.push((index, format!("i64:{}", value)));
            Ok(())
        }
        fn bind_f64(&mut self, index: usize, value: f64) -> QueryResult<()> {
            self.binds.push((index, format!("f64:{}", value)));
            Ok(())
        }
        fn bind_text(&mut self, index: usize, value: &str) -> QueryResult<()> {
            self.binds.push((index, format!("text:{}", value)));
            Ok(())
        }
        fn bind_bytes(&mut self, index: usize, value: &[u8]) -> QueryResult<()> {
            self.binds.push((index, format!("bytes:{}", value.len())));
            Ok(())
        }
    }

    struct Row(Vec<Value>);

    impl ColumnSource for Row {
        fn column_kind(&self, index: usize) -> QueryResult<ColumnKind> {
            Ok(match &self.0[index] {
                Value::Null => ColumnKind::Null,
                Value::Int(_) => ColumnKind::Integer,
                Value::Float(_) => ColumnKind::Real,
                Value::Bytes(_) => ColumnKind::Blob,
                _ => ColumnKind::Text,
            })
        }
        fn get_i64(&self, index: usize) -> QueryResult<i64> {
            self.0[index].as_i64().ok_or_else(|| QueryError::extract_failed(index, "not an integer"))
        }
        fn get_f64(&self, index: usize) -> QueryResult<f64> {
            self.0[index].as_f64().ok_or_else(|| QueryError::extract_failed(index, "not a number"))
        }
        fn get_text(&self, index: usize) -> QueryResult<String> {
            match &self.0[index] {
                Value::String(s) => Ok(s.clone()),
                other => Ok(other.to_string()),
            }
        }
        fn get_bytes(&self, index: usize) -> QueryResult<Vec<u8>> {
            match &self.0[index] {
                Value::Bytes(b) => Ok(b.clone()),
                _ => Err(QueryError::extract_failed(index, "not binary")),
            }
        }
    }

    #[test]
    fn test_registry_considers_native_type() {
        let registry = HandlerRegistry::global();
        assert_eq!(registry.get(ValueType::String, "VARCHAR(255)"), ValueHandler::String);
        assert_eq!(registry.get(ValueType::String, "char(1)"), ValueHandler::FixedChar);
        assert_eq!(registry.get(ValueType::String, "CLOB"), ValueHandler::Clob);
        assert_eq!(registry.get(ValueType::Float, "REAL"), ValueHandler::Double);
        assert_eq!(registry.get(ValueType::Map, "TEXT"), ValueHandler::Object);
    }

    #[test]
    fn test_for_field_uses_alias() {
        let ft = FieldType::new("memo", ValueType::String, "LONG VARCHAR").with_alias("TEXT");
        let field = FieldDescriptor::new("memo", ft);
        assert_eq!(HandlerRegistry::global().for_field(&field), ValueHandler::Clob);
    }

    #[test]
    fn test_bind() {
        let mut rec = Recorder::default();
        ValueHandler::String.bind(&mut rec, 1, &Value::from("a")).unwrap();
        ValueHandler::Integer.bind(&mut rec, 2, &Value::from(18)).unwrap();
        ValueHandler::Double.bind(&mut rec, 3, &Value::from(2)).unwrap();
        ValueHandler::Timestamp.bind(&mut rec, 4, &Value::Null).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ValueHandler::Date.bind(&mut rec, 5, &Value::Date(date)).unwrap();

        assert_eq!(
            rec.binds,
            vec![
                (1, "text:a".to_string()),
                (2, "i64:18".to_string()),
                (3, "f64:2".to_string()),
                (4, "NULL".to_string()),
                (5, "text:2024-03-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_bind_mismatch() {
        let mut rec = Recorder::default();
        let err = ValueHandler::Boolean.bind(&mut rec, 1, &Value::from("Y")).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::BindFailed);
        assert!(ValueHandler::Integer.bind(&mut rec, 1, &Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_extract() {
        let row = Row(vec![
            Value::from("Y  "),
            Value::Null,
            Value::from(86_400_000i64),
            Value::from("12.50"),
            Value::from(&b"hi"[..]),
        ]);
        assert_eq!(ValueHandler::FixedChar.extract(&row, 0).unwrap(), Value::from("Y"));
        assert_eq!(ValueHandler::String.extract(&row, 0).unwrap(), Value::from("Y  "));
        assert_eq!(ValueHandler::Long.extract(&row, 1).unwrap(), Value::Null);

        let ts = ValueHandler::Timestamp.extract(&row, 2).unwrap();
        assert_eq!(ValueHandler::timestamp_millis(&ts), Some(86_400_000));

        assert_eq!(
            ValueHandler::BigDecimal.extract(&row, 3).unwrap(),
            Value::Decimal(Decimal::new(1250, 2))
        );
        assert_eq!(ValueHandler::Clob.extract(&row, 4).unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_natural_handler() {
        assert_eq!(ValueHandler::natural(&Value::from(1)), ValueHandler::Long);
        assert_eq!(ValueHandler::natural(&Value::from("a")), ValueHandler::String);
        assert_eq!(ValueHandler::natural(&Value::from(vec![1])), ValueHandler::Object);
    }
}
