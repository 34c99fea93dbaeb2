//! Field descriptors.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::field_type::FieldType;
use crate::types::ValueType;

/// A single field of an entity.
///
/// Descriptors are immutable once the owning entity is built and are shared
/// behind `Arc` by everything that refers to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Logical field name (`partyId`).
    pub name: SmolStr,
    /// Physical column name (`party_id`).
    pub column_name: SmolStr,
    /// Declared field type.
    pub field_type: FieldType,
    /// Part of the primary key.
    pub is_pk: bool,
    /// Column rejects null.
    pub not_null: bool,
    /// Values are stored encrypted.
    pub encrypt: bool,
}

impl FieldDescriptor {
    /// Create a field whose column name is derived from the logical name.
    pub fn new(name: impl Into<SmolStr>, field_type: FieldType) -> Self {
        let name = name.into();
        let column_name = default_column_name(&name);
        Self {
            name,
            column_name,
            field_type,
            is_pk: false,
            not_null: false,
            encrypt: false,
        }
    }

    /// Get the logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column name.
    pub fn column(&self) -> &str {
        &self.column_name
    }

    /// Declared logical value type.
    pub fn value_type(&self) -> ValueType {
        self.field_type.java_type
    }

    /// Catalog name of the declared type.
    pub fn type_name(&self) -> &str {
        &self.field_type.name
    }

    /// Native column type.
    pub fn sql_type(&self) -> &str {
        &self.field_type.sql_type
    }
}

/// Derive a column name from a logical field name.
///
/// `partyId` becomes `party_id`; names that are already snake case are kept.
pub fn default_column_name(name: &str) -> SmolStr {
    SmolStr::new(name.to_case(Case::Snake))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_name() {
        assert_eq!(default_column_name("partyId"), "party_id");
        assert_eq!(default_column_name("status"), "status");
        assert_eq!(default_column_name("fromDate"), "from_date");
        assert_eq!(default_column_name("already_snake"), "already_snake");
    }

    #[test]
    fn test_field_accessors() {
        let ft = FieldType::new("date-time", ValueType::Timestamp, "TIMESTAMP");
        let field = FieldDescriptor::new("thruDate", ft);
        assert_eq!(field.name(), "thruDate");
        assert_eq!(field.column(), "thru_date");
        assert_eq!(field.value_type(), ValueType::Timestamp);
        assert_eq!(field.type_name(), "date-time");
        assert_eq!(field.sql_type(), "TIMESTAMP");
        assert!(!field.is_pk);
    }
}
