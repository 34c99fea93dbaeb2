//! The closed set of value types a field can declare.

use serde::{Deserialize, Serialize};

/// Logical value type of a field.
///
/// Every field type in the catalog maps onto exactly one of these. Type names
/// coming from configuration are resolved through [`ValueType::from_name`],
/// which accepts the short names as well as the fully qualified spellings
/// historically used by entity definitions (`java.lang.String`,
/// `java.sql.Timestamp`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Character data stored inline (CHAR / VARCHAR).
    String,
    /// Boolean flag.
    Boolean,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Arbitrary precision decimal.
    BigDecimal,
    /// Calendar date without time.
    Date,
    /// Time of day without date.
    Time,
    /// Date and time.
    Timestamp,
    /// Character large object.
    Clob,
    /// Binary large object.
    Blob,
    /// Inline binary data.
    ByteArray,
    /// Any serializable value (stored as JSON).
    Object,
    /// Ordered collection.
    List,
    /// Keyed collection.
    Map,
}

/// Alias table used by [`ValueType::from_name`].
const ALIASES: &[(&str, ValueType)] = &[
    ("String", ValueType::String),
    ("java.lang.String", ValueType::String),
    ("Boolean", ValueType::Boolean),
    ("java.lang.Boolean", ValueType::Boolean),
    ("boolean", ValueType::Boolean),
    ("Integer", ValueType::Integer),
    ("java.lang.Integer", ValueType::Integer),
    ("int", ValueType::Integer),
    ("Long", ValueType::Long),
    ("java.lang.Long", ValueType::Long),
    ("long", ValueType::Long),
    ("Float", ValueType::Float),
    ("java.lang.Float", ValueType::Float),
    ("float", ValueType::Float),
    ("Double", ValueType::Double),
    ("java.lang.Double", ValueType::Double),
    ("double", ValueType::Double),
    ("BigDecimal", ValueType::BigDecimal),
    ("java.math.BigDecimal", ValueType::BigDecimal),
    ("Date", ValueType::Date),
    ("java.sql.Date", ValueType::Date),
    ("Time", ValueType::Time),
    ("java.sql.Time", ValueType::Time),
    ("Timestamp", ValueType::Timestamp),
    ("java.sql.Timestamp", ValueType::Timestamp),
    ("DateTime", ValueType::Timestamp),
    ("Clob", ValueType::Clob),
    ("java.sql.Clob", ValueType::Clob),
    ("Blob", ValueType::Blob),
    ("java.sql.Blob", ValueType::Blob),
    ("byte[]", ValueType::ByteArray),
    ("ByteArray", ValueType::ByteArray),
    ("Object", ValueType::Object),
    ("java.lang.Object", ValueType::Object),
    ("List", ValueType::List),
    ("java.util.List", ValueType::List),
    ("Map", ValueType::Map),
    ("java.util.Map", ValueType::Map),
];

impl ValueType {
    /// All value types, in declaration order.
    pub const ALL: [ValueType; 16] = [
        Self::String,
        Self::Boolean,
        Self::Integer,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::BigDecimal,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::Clob,
        Self::Blob,
        Self::ByteArray,
        Self::Object,
        Self::List,
        Self::Map,
    ];

    /// Resolve a type name through the fixed alias table.
    ///
    /// Matching is case sensitive, so `"string"` does not resolve.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, ty)| *ty)
    }

    /// Canonical short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::BigDecimal => "BigDecimal",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Timestamp => "Timestamp",
            Self::Clob => "Clob",
            Self::Blob => "Blob",
            Self::ByteArray => "ByteArray",
            Self::Object => "Object",
            Self::List => "List",
            Self::Map => "Map",
        }
    }

    /// Whether values of this type are character data.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Clob)
    }

    /// Whether values of this type are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Long | Self::Float | Self::Double | Self::BigDecimal
        )
    }

    /// Whether values of this type are dates, times or timestamps.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }

    /// Whether values of this type are binary.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Blob | Self::ByteArray)
    }

    /// Whether values of this type are collections.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List | Self::Map)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = crate::error::SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| crate::error::SchemaError::UnknownValueType {
            name: s.to_string(),
        })
    }
}
