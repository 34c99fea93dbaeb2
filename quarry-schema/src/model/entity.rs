//! Entity descriptors and their builder.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::field::{FieldDescriptor, default_column_name};
use crate::error::{SchemaError, SchemaResult};
use crate::field_type::{FieldType, FieldTypeCatalog};
use crate::types::ValueType;

/// Read-only description of an entity (maps to a table).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    name: SmolStr,
    table_name: SmolStr,
    fields: IndexMap<SmolStr, Arc<FieldDescriptor>>,
    pk_fields: Vec<SmolStr>,
}

impl EntityDescriptor {
    /// Start building an entity.
    pub fn builder(name: impl Into<SmolStr>) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    /// Get the entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields.get(name)
    }

    /// Look up a field by column name (case insensitive).
    pub fn field_by_column(&self, column: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields
            .values()
            .find(|f| f.column_name.eq_ignore_ascii_case(column))
    }

    /// Check whether the entity declares a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDescriptor>> {
        self.fields.values()
    }

    /// Logical names of all fields in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(SmolStr::as_str)
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Primary key fields in declaration order.
    pub fn pk_fields(&self) -> Vec<&Arc<FieldDescriptor>> {
        self.pk_fields
            .iter()
            .filter_map(|name| self.fields.get(name))
            .collect()
    }

    /// Fields that are not part of the primary key.
    pub fn no_pk_fields(&self) -> Vec<&Arc<FieldDescriptor>> {
        self.fields.values().filter(|f| !f.is_pk).collect()
    }

    /// Whether any field is stored encrypted.
    pub fn has_encrypted_fields(&self) -> bool {
        self.fields.values().any(|f| f.encrypt)
    }
}

/// Declared type of a field before it is resolved.
#[derive(Debug, Clone)]
enum TypeSpec {
    Named(SmolStr),
    Value(ValueType),
}

/// Field definition collected by [`EntityBuilder`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: SmolStr,
    type_spec: TypeSpec,
    column: Option<SmolStr>,
    is_pk: bool,
    not_null: bool,
    encrypt: bool,
}

impl FieldSpec {
    /// A field with a catalog type such as `long-varchar`.
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_spec: TypeSpec::Named(type_name.into()),
            column: None,
            is_pk: false,
            not_null: false,
            encrypt: false,
        }
    }

    /// A field typed directly by value type.
    pub fn typed(name: impl Into<SmolStr>, value_type: ValueType) -> Self {
        Self {
            type_spec: TypeSpec::Value(value_type),
            ..Self::new(name, "")
        }
    }

    /// Override the column name.
    pub fn column(mut self, column: impl Into<SmolStr>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Mark as primary key (implies not null).
    pub fn pk(mut self) -> Self {
        self.is_pk = true;
        self.not_null = true;
        self
    }

    /// Mark as not null.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark as encrypted.
    pub fn encrypt(mut self) -> Self {
        self.encrypt = true;
        self
    }
}

/// Builder for [`EntityDescriptor`].
///
/// ```rust
/// use quarry_schema::{EntityDescriptor, FieldSpec, FieldTypeCatalog};
///
/// let party = EntityDescriptor::builder("Party")
///     .field(FieldSpec::new("partyId", "id").pk())
///     .field(FieldSpec::new("statusId", "id"))
///     .build(FieldTypeCatalog::builtin())
///     .unwrap();
///
/// assert_eq!(party.table_name(), "party");
/// assert_eq!(party.field("statusId").unwrap().column(), "status_id");
/// ```
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    name: SmolStr,
    table_name: Option<SmolStr>,
    fields: Vec<FieldSpec>,
}

impl EntityBuilder {
    /// Create a builder for the named entity.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            fields: Vec::new(),
        }
    }

    /// Override the table name.
    pub fn table(mut self, table_name: impl Into<SmolStr>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Add a field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Add a field typed directly by value type.
    pub fn typed_field(self, name: impl Into<SmolStr>, value_type: ValueType) -> Self {
        self.field(FieldSpec::typed(name, value_type))
    }

    /// Resolve field types against the catalog and validate the definition.
    pub fn build(self, catalog: &FieldTypeCatalog) -> SchemaResult<EntityDescriptor> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::invalid_entity("", "entity name must not be empty"));
        }

        let mut errors = Vec::new();
        let mut fields = IndexMap::with_capacity(self.fields.len());
        let mut columns = HashSet::new();
        let mut pk_fields = Vec::new();

        for spec in self.fields {
            if spec.name.trim().is_empty() {
                errors.push(SchemaError::invalid_field(
                    self.name.as_str(),
                    "",
                    "field name must not be empty",
                ));
                continue;
            }
            if fields.contains_key(&spec.name) {
                errors.push(SchemaError::duplicate(
                    "field",
                    format!("{}.{}", self.name, spec.name),
                ));
                continue;
            }

            let field_type = match &spec.type_spec {
                TypeSpec::Value(vt) => FieldType::for_value_type(*vt),
                TypeSpec::Named(type_name) => match catalog.get(type_name) {
                    Some(ft) => ft.clone(),
                    None => {
                        errors.push(SchemaError::unknown_field_type(
                            self.name.as_str(),
                            spec.name.as_str(),
                            type_name.as_str(),
                        ));
                        continue;
                    }
                },
            };

            let column_name = spec
                .column
                .clone()
                .unwrap_or_else(|| default_column_name(&spec.name));
            if !columns.insert(column_name.to_ascii_lowercase()) {
                errors.push(SchemaError::invalid_field(
                    self.name.as_str(),
                    spec.name.as_str(),
                    format!("column `{}` is mapped more than once", column_name),
                ));
                continue;
            }

            if spec.is_pk {
                pk_fields.push(spec.name.clone());
            }

            let descriptor = FieldDescriptor {
                name: spec.name.clone(),
                column_name,
                field_type,
                is_pk: spec.is_pk,
                not_null: spec.not_null,
                encrypt: spec.encrypt,
            };
            fields.insert(spec.name, Arc::new(descriptor));
        }

        if let Some(err) = SchemaError::collect(errors) {
            return Err(err);
        }

        let table_name = self
            .table_name
            .unwrap_or_else(|| default_column_name(&self.name));

        tracing::debug!(
            entity = %self.name,
            table = %table_name,
            fields = fields.len(),
            "Built entity descriptor"
        );

        Ok(EntityDescriptor {
            name: self.name,
            table_name,
            fields,
            pk_fields,
        })
    }
}
