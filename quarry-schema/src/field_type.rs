//! Field type catalog.
//!
//! A field declares a catalog type such as `long-varchar` or `date-time`. The
//! catalog maps that name to the logical [`ValueType`] used for coercion and
//! to the native SQL column type used when selecting a value handler.

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{SchemaError, SchemaResult};
use crate::types::ValueType;

/// A named field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Catalog name (`long-varchar`).
    pub name: SmolStr,
    /// Logical value type.
    pub java_type: ValueType,
    /// Native column type (`VARCHAR(255)`).
    pub sql_type: SmolStr,
    /// Alternate native type some drivers report back.
    pub sql_type_alias: Option<SmolStr>,
}

impl FieldType {
    /// Create a new field type.
    pub fn new(name: impl Into<SmolStr>, java_type: ValueType, sql_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            java_type,
            sql_type: sql_type.into(),
            sql_type_alias: None,
        }
    }

    /// Anonymous field type for a bare value type, with a generic column type.
    pub fn for_value_type(java_type: ValueType) -> Self {
        let sql_type = match java_type {
            ValueType::String => "VARCHAR(255)",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Integer => "INTEGER",
            ValueType::Long => "BIGINT",
            ValueType::Float => "REAL",
            ValueType::Double => "DOUBLE PRECISION",
            ValueType::BigDecimal => "NUMERIC(18,6)",
            ValueType::Date => "DATE",
            ValueType::Time => "TIME",
            ValueType::Timestamp => "TIMESTAMP",
            ValueType::Clob => "CLOB",
            ValueType::Blob => "BLOB",
            ValueType::ByteArray => "VARBINARY(4000)",
            ValueType::Object | ValueType::List | ValueType::Map => "TEXT",
        };
        Self::new(java_type.as_str(), java_type, sql_type)
    }

    /// Set the alternate native type.
    pub fn with_alias(mut self, alias: impl Into<SmolStr>) -> Self {
        self.sql_type_alias = Some(alias.into());
        self
    }

    /// Native type without any length or precision suffix, upper-cased.
    ///
    /// `VARCHAR(255)` becomes `VARCHAR`, `double precision` becomes
    /// `DOUBLE PRECISION`.
    pub fn base_sql_type(&self) -> String {
        let raw = self.sql_type.as_str();
        let end = raw.find('(').unwrap_or(raw.len());
        raw[..end].trim().to_ascii_uppercase()
    }
}

/// Field type entry as written in `quarry.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldTypeConfig {
    /// Value type name, resolved through the alias table.
    pub java_type: String,
    /// Native column type.
    pub sql_type: String,
    /// Alternate native type.
    #[serde(default)]
    pub sql_type_alias: Option<String>,
}

/// The set of field types known to a datasource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTypeCatalog {
    types: IndexMap<SmolStr, FieldType>,
}

static BUILTIN: LazyLock<FieldTypeCatalog> = LazyLock::new(FieldTypeCatalog::build_builtin);

impl FieldTypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog shared by every datasource.
    pub fn builtin() -> &'static FieldTypeCatalog {
        &BUILTIN
    }

    fn build_builtin() -> Self {
        use ValueType as V;

        let mut catalog = Self::new();
        let entries: &[(&str, ValueType, &str)] = &[
            ("blob", V::Blob, "BLOB"),
            ("byte-array", V::ByteArray, "VARBINARY(4000)"),
            ("object", V::Object, "TEXT"),
            ("date-time", V::Timestamp, "TIMESTAMP"),
            ("date", V::Date, "DATE"),
            ("time", V::Time, "TIME"),
            ("currency-amount", V::BigDecimal, "NUMERIC(18,2)"),
            ("currency-precise", V::BigDecimal, "NUMERIC(18,3)"),
            ("fixed-point", V::BigDecimal, "NUMERIC(18,6)"),
            ("floating-point", V::Double, "DOUBLE PRECISION"),
            ("numeric", V::Long, "NUMERIC(20,0)"),
            ("integer", V::Integer, "INTEGER"),
            ("boolean", V::Boolean, "BOOLEAN"),
            ("id", V::String, "VARCHAR(20)"),
            ("id-long", V::String, "VARCHAR(60)"),
            ("id-vlong", V::String, "VARCHAR(255)"),
            ("indicator", V::String, "CHAR(1)"),
            ("very-short", V::String, "VARCHAR(10)"),
            ("short-varchar", V::String, "VARCHAR(60)"),
            ("long-varchar", V::String, "VARCHAR(255)"),
            ("very-long", V::String, "TEXT"),
            ("comment", V::String, "VARCHAR(255)"),
            ("description", V::String, "VARCHAR(255)"),
            ("name", V::String, "VARCHAR(100)"),
            ("value", V::String, "VARCHAR(255)"),
            ("email", V::String, "VARCHAR(320)"),
            ("url", V::String, "VARCHAR(2000)"),
            ("tel-number", V::String, "VARCHAR(60)"),
            ("credit-card-number", V::String, "VARCHAR(255)"),
        ];
        for (name, java_type, sql_type) in entries {
            catalog.insert(FieldType::new(*name, *java_type, *sql_type));
        }
        catalog
    }

    /// Add or replace a field type.
    pub fn insert(&mut self, field_type: FieldType) -> Option<FieldType> {
        self.types.insert(field_type.name.clone(), field_type)
    }

    /// Look up a field type by name.
    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.types.get(name)
    }

    /// Check whether a field type exists.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of field types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all field types in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldType> {
        self.types.values()
    }

    /// Merge entries from configuration, overriding existing names.
    pub fn extend_from_config<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a String, &'a FieldTypeConfig)>,
    ) -> SchemaResult<()> {
        let mut errors = Vec::new();
        for (name, cfg) in entries {
            match ValueType::from_name(&cfg.java_type) {
                Some(java_type) => {
                    let mut ft = FieldType::new(name.as_str(), java_type, cfg.sql_type.as_str());
                    if let Some(alias) = &cfg.sql_type_alias {
                        ft = ft.with_alias(alias.as_str());
                    }
                    self.insert(ft);
                }
                None => errors.push(SchemaError::ConfigError {
                    message: format!(
                        "field type `{}` declares unknown java_type `{}`",
                        name, cfg.java_type
                    ),
                }),
            }
        }
        match SchemaError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
