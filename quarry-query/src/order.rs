//! ORDER BY rendering and in-memory sorting.
//!
//! Both sides place nulls the same way: below every other value unless a
//! [`NullsOrder`] says otherwise, so nulls lead an ascending sort and trail a
//! descending one. Dialects without native `NULLS FIRST/LAST` get a
//! `CASE WHEN col IS NULL` sort key in front of the column.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use quarry_schema::{DialectConfig, FieldSource};

use crate::compare::{compare_values, sort_order};
use crate::condition::{FieldRef, Function};
use crate::error::{QueryError, QueryResult};
use crate::record::Record;
use crate::value::Value;

/// Where nulls go in a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    /// Nulls appear first in the results.
    First,
    /// Nulls appear last in the results.
    Last,
}

impl NullsOrder {
    /// Get the SQL clause for this null order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderByField {
    /// Field to sort on.
    pub field: FieldRef,
    /// Sort descending.
    pub descending: bool,
    /// Explicit null placement.
    pub nulls: Option<NullsOrder>,
    /// Compare upper-cased text.
    pub ignore_case: bool,
}

impl OrderByField {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<FieldRef>) -> Self {
        Self {
            field: field.into(),
            descending: false,
            nulls: None,
            ignore_case: false,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<FieldRef>) -> Self {
        Self {
            descending: true,
            ..Self::asc(field)
        }
    }

    /// Set null handling.
    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Sort case-insensitively.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Parse `"name"`, `"-name"`, `"+name"`, `"name DESC NULLS LAST"` or
    /// `"UPPER(name) ASC"`. Keywords are case-insensitive.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let invalid = |detail: &str| {
            QueryError::invalid_condition(format!("invalid order-by `{}`: {}", text, detail))
        };

        let trimmed = text.trim();
        let (descending, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (Some(true), &trimmed[1..]),
            Some(b'+') => (Some(false), &trimmed[1..]),
            _ => (None, trimmed),
        };

        let mut tokens = rest.split_whitespace();
        let Some(mut name) = tokens.next() else {
            return Err(invalid("missing field name"));
        };

        let mut ignore_case = false;
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("UPPER(") && name.ends_with(')') {
            ignore_case = true;
            name = name["UPPER(".len()..name.len() - 1].trim();
            if name.is_empty() {
                return Err(invalid("missing field name"));
            }
        }

        let field = match name.split_once('.') {
            Some((alias, field)) if !alias.is_empty() && !field.is_empty() => FieldRef::aliased(alias, field),
            Some(_) => return Err(invalid("malformed qualified name")),
            None => FieldRef::new(name),
        };

        let mut order = Self {
            field,
            descending: descending.unwrap_or(false),
            nulls: None,
            ignore_case,
        };

        let rest: Vec<String> = tokens.map(str::to_ascii_uppercase).collect();
        let mut rest = rest.iter().map(String::as_str).peekable();
        match rest.peek() {
            Some(&"ASC") | Some(&"DESC") if descending.is_some() => {
                return Err(invalid("direction given twice"));
            }
            Some(&"ASC") => {
                rest.next();
            }
            Some(&"DESC") => {
                order.descending = true;
                rest.next();
            }
            _ => {}
        }
        match (rest.next(), rest.next()) {
            (None, _) => {}
            (Some("NULLS"), Some("FIRST")) => order.nulls = Some(NullsOrder::First),
            (Some("NULLS"), Some("LAST")) => order.nulls = Some(NullsOrder::Last),
            _ => return Err(invalid("expected ASC, DESC, NULLS FIRST or NULLS LAST")),
        }
        if rest.next().is_some() {
            return Err(invalid("unexpected trailing text"));
        }
        Ok(order)
    }

    /// Whether nulls sort before other values for this term.
    pub fn nulls_first(&self) -> bool {
        match self.nulls {
            Some(NullsOrder::First) => true,
            Some(NullsOrder::Last) => false,
            None => !self.descending,
        }
    }

    /// Render this term against a schema.
    pub fn to_sql(&self, source: &dyn FieldSource, dialect: &DialectConfig) -> QueryResult<String> {
        let mut sql = String::with_capacity(32);
        self.write_sql(&mut sql, source, dialect)?;
        Ok(sql)
    }

    /// Write this term to a buffer.
    pub fn write_sql(&self, buffer: &mut String, source: &dyn FieldSource, dialect: &DialectConfig) -> QueryResult<()> {
        let resolved = source.resolve(self.field.name(), self.field.alias()).ok_or_else(|| {
            QueryError::unknown_field(source.source_name(), self.field.to_string(), source.field_names())
                .with_context("rendering ORDER BY")
        })?;
        let column = if self.ignore_case {
            format!("UPPER({})", resolved.column)
        } else {
            resolved.column
        };
        let direction = if self.descending { "DESC" } else { "ASC" };

        match self.nulls {
            Some(nulls) if dialect.supports_nulls_ordering => {
                buffer.push_str(&column);
                buffer.push(' ');
                buffer.push_str(direction);
                buffer.push(' ');
                buffer.push_str(nulls.as_sql());
            }
            Some(nulls) => {
                let (null_key, other_key) = match nulls {
                    NullsOrder::First => (0, 1),
                    NullsOrder::Last => (1, 0),
                };
                buffer.push_str(&format!(
                    "CASE WHEN {} IS NULL THEN {} ELSE {} END, {} {}",
                    column, null_key, other_key, column, direction
                ));
            }
            None => {
                buffer.push_str(&column);
                buffer.push(' ');
                buffer.push_str(direction);
            }
        }
        Ok(())
    }

    fn key<'a>(&self, record: &'a dyn Record) -> std::borrow::Cow<'a, Value> {
        let value = record.value(self.field.name());
        if self.ignore_case {
            std::borrow::Cow::Owned(Function::Upper.apply(value))
        } else {
            std::borrow::Cow::Borrowed(value)
        }
    }

    fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        let (a, b) = (self.key(a), self.key(b));
        if a.is_null() || b.is_null() {
            return sort_order(&a, &b, self.nulls_first());
        }
        let ordering = compare_values(&a, &b).unwrap_or(Ordering::Equal);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl FromStr for OrderByField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrderByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_case {
            write!(f, "UPPER({})", self.field)?;
        } else {
            write!(f, "{}", self.field)?;
        }
        f.write_str(if self.descending { " DESC" } else { " ASC" })?;
        if let Some(nulls) = self.nulls {
            write!(f, " {}", nulls.as_sql())?;
        }
        Ok(())
    }
}

/// Parse a list of order-by strings.
pub fn parse_order_by<S: AsRef<str>>(terms: impl IntoIterator<Item = S>) -> QueryResult<Vec<OrderByField>> {
    terms.into_iter().map(|t| OrderByField::parse(t.as_ref())).collect()
}

/// Render ` ORDER BY ...`, or an empty string when there are no terms.
pub fn order_by_clause(
    order_by: &[OrderByField],
    source: &dyn FieldSource,
    dialect: &DialectConfig,
) -> QueryResult<String> {
    if order_by.is_empty() {
        return Ok(String::new());
    }
    let mut sql = String::from(" ORDER BY ");
    for (i, term) in order_by.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        term.write_sql(&mut sql, source, dialect)?;
    }
    Ok(sql)
}

/// Stable in-memory sort matching the SQL ordering.
pub fn sort_records<R: Record>(records: &mut [R], order_by: &[OrderByField]) {
    if order_by.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        order_by
            .iter()
            .map(|term| term.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use quarry_schema::{EntityDescriptor, FieldTypeCatalog, ValueType};

    fn person() -> EntityDescriptor {
        EntityDescriptor::builder("Person")
            .typed_field("lastName", ValueType::String)
            .typed_field("age", ValueType::Integer)
            .build(FieldTypeCatalog::builtin())
            .unwrap()
    }

    fn row(name: Option<&str>, age: Option<i64>) -> IndexMap<String, Value> {
        let mut r = IndexMap::new();
        r.insert("lastName".to_string(), name.map(Value::from).unwrap_or(Value::Null));
        r.insert("age".to_string(), age.map(Value::from).unwrap_or(Value::Null));
        r
    }

    #[test]
    fn test_parse() {
        assert_eq!(OrderByField::parse("-age").unwrap(), OrderByField::desc("age"));
        assert_eq!(OrderByField::parse("+age").unwrap(), OrderByField::asc("age"));
        assert_eq!(
            OrderByField::parse("age desc nulls last").unwrap(),
            OrderByField::desc("age").nulls(NullsOrder::Last)
        );
        assert_eq!(
            OrderByField::parse("UPPER(lastName) ASC").unwrap(),
            OrderByField::asc("lastName").ignore_case()
        );
        assert_eq!(
            OrderByField::parse("P.lastName").unwrap().field,
            FieldRef::aliased("P", "lastName")
        );
        assert!(OrderByField::parse("").is_err());
        assert!(OrderByField::parse("-age DESC").is_err());
        assert!(OrderByField::parse("age NULLS").is_err());
        assert!(OrderByField::parse("age ASC extra").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["age ASC", "UPPER(lastName) DESC NULLS FIRST"] {
            assert_eq!(text.parse::<OrderByField>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_render_native_and_emulated() {
        let entity = person();
        let order = vec![
            OrderByField::desc("age").nulls(NullsOrder::Last),
            OrderByField::asc("lastName").ignore_case(),
        ];
        assert_eq!(
            order_by_clause(&order, &entity, &DialectConfig::sqlite()).unwrap(),
            " ORDER BY age DESC NULLS LAST, UPPER(last_name) ASC"
        );
        assert_eq!(
            order_by_clause(&order, &entity, &DialectConfig::mysql()).unwrap(),
            " ORDER BY CASE WHEN age IS NULL THEN 1 ELSE 0 END, age DESC, UPPER(last_name) ASC"
        );
        assert_eq!(order_by_clause(&[], &entity, &DialectConfig::default()).unwrap(), "");
    }

    #[test]
    fn test_render_unknown_field() {
        let err = OrderByField::asc("nope").to_sql(&person(), &DialectConfig::default()).unwrap_err();
        assert!(err.is_unknown_field());
    }

    #[test]
    fn test_sort_records_nulls_low_by_default() {
        let mut rows = vec![row(Some("b"), Some(3)), row(None, None), row(Some("A"), Some(1))];

        sort_records(&mut rows, &[OrderByField::asc("age")]);
        let ages: Vec<&Value> = rows.iter().map(|r| &r["age"]).collect();
        assert_eq!(ages, vec![&Value::Null, &Value::Int(1), &Value::Int(3)]);

        sort_records(&mut rows, &[OrderByField::desc("age")]);
        let ages: Vec<&Value> = rows.iter().map(|r| &r["age"]).collect();
        assert_eq!(ages, vec![&Value::Int(3), &Value::Int(1), &Value::Null]);

        sort_records(&mut rows, &[OrderByField::asc("age").nulls(NullsOrder::Last)]);
        assert_eq!(rows[2]["age"], Value::Null);
    }

    #[test]
    fn test_sort_ignore_case_and_ties() {
        let mut rows = vec![row(Some("b"), Some(2)), row(Some("A"), Some(2)), row(Some("a"), Some(1))];
        sort_records(&mut rows, &parse_order_by(["-age", "UPPER(lastName)"]).unwrap());
        let names: Vec<&Value> = rows.iter().map(|r| &r["lastName"]).collect();
        assert_eq!(names, vec![&Value::from("A"), &Value::from("b"), &Value::from("a")]);
    }
}
