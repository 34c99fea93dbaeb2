//! Value coercion between runtime values and declared field types.
//!
//! [`coerce`] is a pure function. When the value is already an instance of the
//! target type it is returned unchanged; otherwise it is converted by the
//! rules below. Failures name both the source and target type. With
//! `fail_on_miss = false` a failure is logged and the original value is
//! returned instead.
//!
//! - Strings are parsed per target type. Booleans accept the indicator
//!   convention (`Y`/`T`, `N`/`F`) before `true`/`false`. Numbers use the
//!   locale's separators when a locale is given. Temporals use the format hint
//!   or ISO defaults.
//! - An empty string converted to a non-textual type yields `Null`.
//! - Numbers widen and narrow freely; narrowing truncates toward zero and is
//!   range checked.
//! - Lists and maps are never converted to strings.
//!
//! ```rust
//! use quarry_query::{Value, coerce::coerce};
//! use quarry_schema::ValueType;
//!
//! assert_eq!(coerce(Value::from("Y"), ValueType::Boolean, None, None, true).unwrap(), Value::Bool(true));
//! assert!(coerce(Value::from("maybe"), ValueType::Boolean, None, None, true).is_err());
//! assert_eq!(coerce(Value::from(""), ValueType::Integer, None, None, false).unwrap(), Value::Null);
//! ```

mod locale;
mod temporal;

pub use locale::Locale;
pub(crate) use temporal::{parse_timestamp, to_epoch_millis};

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use quarry_schema::{CoercionConfig, FieldDescriptor, ValueType};

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Convert `value` to `target`.
pub fn coerce(
    value: Value,
    target: ValueType,
    format: Option<&str>,
    locale: Option<&Locale>,
    fail_on_miss: bool,
) -> QueryResult<Value> {
    if value.is_instance_of(target) {
        return Ok(value);
    }

    match convert(&value, target, format, locale) {
        Ok(converted) => Ok(converted),
        Err(detail) if fail_on_miss => Err(QueryError::coercion(value.type_name(), target, detail)),
        Err(detail) => {
            tracing::warn!(
                from = value.type_name(),
                to = %target,
                detail = %detail,
                "Coercion failed, keeping original value"
            );
            Ok(value)
        }
    }
}

/// Convert `value` to the type named `type_name`.
///
/// The name is resolved through the fixed alias table; an unknown name is
/// always an error regardless of `fail_on_miss`.
pub fn coerce_named(
    value: Value,
    type_name: &str,
    format: Option<&str>,
    locale: Option<&Locale>,
    fail_on_miss: bool,
) -> QueryResult<Value> {
    let target = ValueType::from_name(type_name).ok_or_else(|| QueryError::unknown_type(type_name))?;
    coerce(value, target, format, locale, fail_on_miss)
}

/// Coercion with defaults taken from configuration.
#[derive(Debug, Clone)]
pub struct Coercer {
    fail_on_miss: bool,
    locale: Option<Locale>,
    date_format: Option<String>,
    time_format: Option<String>,
    timestamp_format: Option<String>,
}

impl Default for Coercer {
    fn default() -> Self {
        Self {
            fail_on_miss: true,
            locale: None,
            date_format: None,
            time_format: None,
            timestamp_format: None,
        }
    }
}

impl Coercer {
    /// Strict coercer with ISO formats and no locale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[coercion]` section.
    pub fn from_config(config: &CoercionConfig) -> QueryResult<Self> {
        let locale = match &config.locale {
            Some(tag) => Some(Locale::parse(tag).ok_or_else(|| {
                QueryError::invalid_configuration(format!("unknown locale `{}`", tag))
            })?),
            None => None,
        };
        Ok(Self {
            fail_on_miss: config.fail_on_miss,
            locale,
            date_format: config.date_format.clone(),
            time_format: config.time_format.clone(),
            timestamp_format: config.timestamp_format.clone(),
        })
    }

    /// Set the failure mode.
    pub fn with_fail_on_miss(mut self, fail_on_miss: bool) -> Self {
        self.fail_on_miss = fail_on_miss;
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Whether failures are errors.
    pub fn fail_on_miss(&self) -> bool {
        self.fail_on_miss
    }

    /// Convert `value` to `target` with the configured hints.
    pub fn coerce(&self, value: Value, target: ValueType) -> QueryResult<Value> {
        let format = self.format_for(&value, target);
        coerce(value, target, format, self.locale.as_ref(), self.fail_on_miss)
    }

    /// Convert `value` to the declared type of `field`.
    pub fn coerce_for(&self, value: Value, field: &FieldDescriptor) -> QueryResult<Value> {
        self.coerce(value, field.value_type())
            .map_err(|e| e.with_field(field.name()))
    }

    fn format_for(&self, value: &Value, target: ValueType) -> Option<&str> {
        // Formatting to text uses the source's format; parsing uses the target's.
        let kind = if target.is_textual() {
            value.value_type()
        } else {
            target
        };
        match kind {
            ValueType::Date => self.date_format.as_deref(),
            ValueType::Time => self.time_format.as_deref(),
            ValueType::Timestamp => self.timestamp_format.as_deref(),
            _ => None,
        }
    }
}

/// A number, or numeric text, with a nonzero fractional part.
///
/// Converting these to `Integer` or `Long` truncates, so comparisons
/// against integral columns keep them as `Float` or `Decimal` instead.
pub(crate) fn fractional_number(value: &Value) -> Option<Value> {
    match value {
        Value::Float(f) if f.is_finite() && f.fract() != 0.0 => Some(value.clone()),
        Value::Decimal(d) if !d.fract().is_zero() => Some(value.clone()),
        Value::String(s) => parse_decimal(s, None)
            .ok()
            .filter(|d| !d.fract().is_zero())
            .map(Value::Decimal),
        _ => None,
    }
}

fn convert(
    value: &Value,
    target: ValueType,
    format: Option<&str>,
    locale: Option<&Locale>,
) -> Result<Value, String> {
    use ValueType as V;

    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => from_string(s, target, format, locale),
        Value::Int(i) => from_int(*i, target, locale),
        Value::Float(f) => from_float(*f, target, locale),
        Value::Decimal(d) => from_decimal(d, target, locale),
        Value::Bool(b) => match target {
            V::String | V::Clob => Ok(Value::String(b.to_string())),
            _ => Err(unsupported(value, target)),
        },
        Value::Date(d) => match target {
            V::Timestamp => Ok(Value::Timestamp(d.and_time(NaiveTime::MIN))),
            V::Long => Ok(Value::Int(to_epoch_millis(&d.and_time(NaiveTime::MIN)))),
            V::String | V::Clob => Ok(Value::String(temporal::format_date(d, format))),
            _ => Err(unsupported(value, target)),
        },
        Value::Time(t) => match target {
            V::Timestamp => Ok(Value::Timestamp(NaiveDate::default().and_time(*t))),
            V::String | V::Clob => Ok(Value::String(temporal::format_time(t, format))),
            _ => Err(unsupported(value, target)),
        },
        Value::Timestamp(ts) => match target {
            V::Date => Ok(Value::Date(ts.date())),
            V::Time => Ok(Value::Time(ts.time())),
            V::Long => Ok(Value::Int(to_epoch_millis(ts))),
            V::String | V::Clob => Ok(Value::String(temporal::format_timestamp(ts, format))),
            _ => Err(unsupported(value, target)),
        },
        Value::Bytes(_) => Err(unsupported(value, target)),
        Value::List(_) | Value::Map(_) => Err(format!(
            "a {} is never converted to {}",
            value.type_name(),
            target
        )),
        Value::Json(json) => match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => {
                let native = match json {
                    serde_json::Value::Bool(b) => Value::Bool(*b),
                    other => match other.as_i64() {
                        Some(i) => Value::Int(i),
                        None => Value::Float(other.as_f64().unwrap_or(f64::NAN)),
                    },
                };
                if native.is_instance_of(target) {
                    Ok(native)
                } else {
                    convert(&native, target, format, locale)
                }
            }
            serde_json::Value::String(s) => from_string(s, target, format, locale),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(format!(
                "a JSON structure is never converted to {}",
                target
            )),
        },
    }
}

fn unsupported(value: &Value, target: ValueType) -> String {
    format!("no conversion from {} to {}", value.type_name(), target)
}

fn from_string(
    s: &str,
    target: ValueType,
    format: Option<&str>,
    locale: Option<&Locale>,
) -> Result<Value, String> {
    use ValueType as V;

    if s.is_empty() && !target.is_textual() {
        return Ok(Value::Null);
    }

    match target {
        V::String | V::Clob | V::Object => Ok(Value::String(s.to_string())),
        V::Boolean => parse_bool(s).map(Value::Bool),
        V::Integer => {
            let i = parse_integral(s, locale)?;
            i32::try_from(i)
                .map(|_| Value::Int(i))
                .map_err(|_| format!("{} is out of range for Integer", i))
        }
        V::Long => parse_integral(s, locale).map(Value::Int),
        V::Float | V::Double => {
            let canonical = canonical_number(s, locale);
            f64::from_str(&canonical)
                .map(Value::Float)
                .map_err(|_| format!("`{}` is not a number", s))
        }
        V::BigDecimal => parse_decimal(s, locale).map(Value::Decimal),
        V::Date => temporal::parse_date(s, format).map(Value::Date),
        V::Time => temporal::parse_time(s, format).map(Value::Time),
        V::Timestamp => temporal::parse_timestamp(s, format).map(Value::Timestamp),
        V::Blob | V::ByteArray => Ok(Value::Bytes(s.as_bytes().to_vec())),
        V::List => parse_list(s),
        V::Map => parse_map(s),
    }
}

fn from_int(i: i64, target: ValueType, locale: Option<&Locale>) -> Result<Value, String> {
    use ValueType as V;

    match target {
        V::Integer => i32::try_from(i)
            .map(|_| Value::Int(i))
            .map_err(|_| format!("{} is out of range for Integer", i)),
        V::Long => Ok(Value::Int(i)),
        V::Float | V::Double => Ok(Value::Float(i as f64)),
        V::BigDecimal => Ok(Value::Decimal(Decimal::from(i))),
        V::String | V::Clob => Ok(Value::String(localize(&i.to_string(), locale))),
        V::Timestamp => temporal::from_epoch_millis(i).map(Value::Timestamp),
        V::Date => temporal::from_epoch_millis(i).map(|ts| Value::Date(ts.date())),
        V::Time => temporal::from_epoch_millis(i).map(|ts| Value::Time(ts.time())),
        _ => Err(format!("no conversion from Long to {}", target)),
    }
}

fn from_float(f: f64, target: ValueType, locale: Option<&Locale>) -> Result<Value, String> {
    use ValueType as V;

    match target {
        V::Integer | V::Long => {
            if !f.is_finite() {
                return Err(format!("{} has no integral value", f));
            }
            let truncated = f.trunc();
            let fits = match target {
                V::Integer => truncated >= i32::MIN as f64 && truncated <= i32::MAX as f64,
                _ => truncated >= i64::MIN as f64 && truncated < i64::MAX as f64,
            };
            if fits {
                Ok(Value::Int(truncated as i64))
            } else {
                Err(format!("{} is out of range for {}", f, target))
            }
        }
        V::Float | V::Double => Ok(Value::Float(f)),
        V::BigDecimal => Decimal::try_from(f)
            .map(Value::Decimal)
            .map_err(|e| format!("{} is not representable as BigDecimal: {}", f, e)),
        V::String | V::Clob => Ok(Value::String(localize(&f.to_string(), locale))),
        _ => Err(format!("no conversion from Double to {}", target)),
    }
}

fn from_decimal(d: &Decimal, target: ValueType, locale: Option<&Locale>) -> Result<Value, String> {
    use ValueType as V;

    match target {
        V::Integer | V::Long => {
            let truncated = d
                .trunc()
                .to_i64()
                .ok_or_else(|| format!("{} is out of range for {}", d, target))?;
            from_int(truncated, target, locale)
        }
        V::Float | V::Double => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("{} is out of range for {}", d, target)),
        V::BigDecimal => Ok(Value::Decimal(*d)),
        V::String | V::Clob => Ok(Value::String(localize(&d.to_string(), locale))),
        _ => Err(format!("no conversion from BigDecimal to {}", target)),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    let t = s.trim();
    if t.eq_ignore_ascii_case("y") || t.eq_ignore_ascii_case("t") {
        Ok(true)
    } else if t.eq_ignore_ascii_case("n") || t.eq_ignore_ascii_case("f") {
        Ok(false)
    } else if t.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if t.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("`{}` is not a boolean", s))
    }
}

fn canonical_number(s: &str, locale: Option<&Locale>) -> String {
    match locale {
        Some(locale) => locale.normalize_number(s),
        None => s.trim().to_string(),
    }
}

fn localize(canonical: &str, locale: Option<&Locale>) -> String {
    match locale {
        Some(locale) => locale.localize_number(canonical),
        None => canonical.to_string(),
    }
}

/// Integral parse; a fractional value is truncated toward zero.
fn parse_integral(s: &str, locale: Option<&Locale>) -> Result<i64, String> {
    let canonical = canonical_number(s, locale);
    if let Ok(i) = i64::from_str(&canonical) {
        return Ok(i);
    }
    let d = parse_decimal(s, locale)?;
    d.trunc()
        .to_i64()
        .ok_or_else(|| format!("`{}` is out of range for Long", s))
}

fn parse_decimal(s: &str, locale: Option<&Locale>) -> Result<Decimal, String> {
    let canonical = canonical_number(s, locale);
    Decimal::from_str(&canonical)
        .or_else(|_| Decimal::from_scientific(&canonical))
        .map_err(|_| format!("`{}` is not a number", s))
}

fn strip_delimiters(s: &str, open: char, close: char) -> Option<&str> {
    s.trim().strip_prefix(open)?.strip_suffix(close).map(str::trim)
}

/// `[a, b]` into a list of strings.
fn parse_list(s: &str) -> Result<Value, String> {
    let inner = strip_delimiters(s, '[', ']').ok_or_else(|| format!("`{}` is not a [..] list", s))?;
    if inner.is_empty() {
        return Ok(Value::List(Vec::new()));
    }
    Ok(Value::List(
        inner
            .split(',')
            .map(|item| Value::String(item.trim().to_string()))
            .collect(),
    ))
}

/// `{k=v, k2=v2}` into a map of strings.
fn parse_map(s: &str) -> Result<Value, String> {
    let inner = strip_delimiters(s, '{', '}').ok_or_else(|| format!("`{}` is not a {{..}} map", s))?;
    let mut map = IndexMap::new();
    if inner.is_empty() {
        return Ok(Value::Map(map));
    }
    for entry in inner.split(',') {
        let (k, v) = entry
            .split_once('=')
            .ok_or_else(|| format!("map entry `{}` has no `=`", entry.trim()))?;
        map.insert(k.trim().to_string(), Value::String(v.trim().to_string()));
    }
    Ok(Value::Map(map))
}
