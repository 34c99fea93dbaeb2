//! Operands of a comparison: field references, literals and functions.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use quarry_schema::ValueType;

use crate::coerce::coerce;
use crate::value::Value;

/// A reference to a field by logical name, optionally qualified by a view
/// member alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Logical field name.
    pub name: SmolStr,
    /// View member alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<SmolStr>,
}

impl FieldRef {
    /// An unqualified reference.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// A reference qualified by a view member alias.
    pub fn aliased(alias: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}", alias, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<SmolStr> for FieldRef {
    fn from(name: SmolStr) -> Self {
        Self::new(name)
    }
}

impl From<&SmolStr> for FieldRef {
    fn from(name: &SmolStr) -> Self {
        Self::new(name.clone())
    }
}

/// Scalar functions that can wrap an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    /// `UPPER(x)`
    Upper,
    /// `LOWER(x)`
    Lower,
    /// `TRIM(x)`
    Trim,
    /// `LENGTH(x)`
    Length,
}

impl Function {
    /// SQL function name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Upper => "UPPER",
            Self::Lower => "LOWER",
            Self::Trim => "TRIM",
            Self::Length => "LENGTH",
        }
    }

    /// The type produced by the function.
    pub fn result_type(&self, operand: ValueType) -> ValueType {
        match self {
            Self::Length => ValueType::Long,
            _ if operand.is_textual() => operand,
            _ => ValueType::String,
        }
    }

    /// Evaluate in memory. Null and values without a text form yield null.
    ///
    /// `TRIM` strips spaces only, as SQL does.
    pub fn apply(&self, value: &Value) -> Value {
        if let (Self::Length, Value::Bytes(bytes)) = (self, value) {
            return Value::Int(bytes.len() as i64);
        }
        let text = match value {
            Value::Null => return Value::Null,
            Value::String(s) => s.clone(),
            other => match coerce(other.clone(), ValueType::String, None, None, true) {
                Ok(Value::String(s)) => s,
                _ => return Value::Null,
            },
        };
        match self {
            Self::Upper => Value::String(text.to_uppercase()),
            Self::Lower => Value::String(text.to_lowercase()),
            Self::Trim => Value::String(text.trim_matches(' ').to_string()),
            Self::Length => Value::Int(text.chars().count() as i64),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    /// A field reference.
    Field(FieldRef),
    /// A literal value.
    Literal(Value),
    /// A function applied to another operand.
    Function {
        /// The function.
        kind: Function,
        /// Its operand.
        operand: Box<ValueExpr>,
    },
}

impl ValueExpr {
    /// An unqualified field reference.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::Field(FieldRef::new(name))
    }

    /// A field reference qualified by a view member alias.
    pub fn aliased(alias: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self::Field(FieldRef::aliased(alias, name))
    }

    /// A literal.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Wrap in a function.
    pub fn function(kind: Function, operand: impl Into<ValueExpr>) -> Self {
        Self::Function {
            kind,
            operand: Box::new(operand.into()),
        }
    }

    /// `UPPER(operand)`
    pub fn upper(operand: impl Into<ValueExpr>) -> Self {
        Self::function(Function::Upper, operand)
    }

    /// `LOWER(operand)`
    pub fn lower(operand: impl Into<ValueExpr>) -> Self {
        Self::function(Function::Lower, operand)
    }

    /// `TRIM(operand)`
    pub fn trim(operand: impl Into<ValueExpr>) -> Self {
        Self::function(Function::Trim, operand)
    }

    /// `LENGTH(operand)`
    pub fn length(operand: impl Into<ValueExpr>) -> Self {
        Self::function(Function::Length, operand)
    }

    /// Whether this is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Borrow the literal value.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// The field at the bottom of this expression, if any.
    pub fn field_ref(&self) -> Option<&FieldRef> {
        match self {
            Self::Field(field) => Some(field),
            Self::Literal(_) => None,
            Self::Function { operand, .. } => operand.field_ref(),
        }
    }

    /// Whether the outermost node is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function { .. })
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "{}", field),
            Self::Literal(value) => write!(f, "{}", value),
            Self::Function { kind, operand } => write!(f, "{}({})", kind, operand),
        }
    }
}

impl From<FieldRef> for ValueExpr {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<Value> for ValueExpr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ValueExpr::aliased("PTY", "partyId").to_string(), "PTY.partyId");
        assert_eq!(ValueExpr::upper(ValueExpr::field("name")).to_string(), "UPPER(name)");
        assert_eq!(ValueExpr::literal("x").to_string(), "'x'");
    }

    #[test]
    fn test_field_ref_through_function() {
        let expr = ValueExpr::length(ValueExpr::trim(ValueExpr::field("code")));
        assert_eq!(expr.field_ref().map(FieldRef::name), Some("code"));
        assert!(ValueExpr::literal(1).field_ref().is_none());
    }

    #[test]
    fn test_apply() {
        assert_eq!(Function::Upper.apply(&Value::from("abc")), Value::from("ABC"));
        assert_eq!(Function::Lower.apply(&Value::from("ABC")), Value::from("abc"));
        assert_eq!(Function::Trim.apply(&Value::from("  a b ")), Value::from("a b"));
        assert_eq!(Function::Length.apply(&Value::from("héllo")), Value::Int(5));
        assert_eq!(Function::Length.apply(&Value::Int(123)), Value::Int(3));
        assert_eq!(Function::Upper.apply(&Value::Null), Value::Null);
    }

    #[test]
    fn test_result_type() {
        assert_eq!(Function::Length.result_type(ValueType::String), ValueType::Long);
        assert_eq!(Function::Upper.result_type(ValueType::Clob), ValueType::Clob);
        assert_eq!(Function::Upper.result_type(ValueType::Long), ValueType::String);
    }
}
