//! Field resolution shared by entities and views.

use std::sync::Arc;

use crate::model::{EntityDescriptor, FieldDescriptor, ViewDescriptor};

/// A field reference resolved against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// The field's descriptor.
    pub field: Arc<FieldDescriptor>,
    /// Column text to emit, qualified when the source requires it.
    pub column: String,
}

/// Something a condition can be compiled against.
pub trait FieldSource {
    /// Entity or view name, used in diagnostics.
    fn source_name(&self) -> &str;

    /// Resolve a logical field name, optionally qualified by an alias.
    fn resolve(&self, name: &str, alias: Option<&str>) -> Option<ResolvedField>;

    /// Names that resolve without an alias.
    fn field_names(&self) -> Vec<&str>;
}

impl FieldSource for EntityDescriptor {
    fn source_name(&self) -> &str {
        self.name()
    }

    fn resolve(&self, name: &str, alias: Option<&str>) -> Option<ResolvedField> {
        let field = self.field(name)?;
        let column = match alias {
            Some(alias) => format!("{}.{}", alias, field.column()),
            None => field.column().to_string(),
        };
        Some(ResolvedField {
            field: Arc::clone(field),
            column,
        })
    }

    fn field_names(&self) -> Vec<&str> {
        EntityDescriptor::field_names(self).collect()
    }
}

impl FieldSource for ViewDescriptor {
    fn source_name(&self) -> &str {
        self.name()
    }

    fn resolve(&self, name: &str, alias: Option<&str>) -> Option<ResolvedField> {
        match alias {
            Some(alias) => {
                let member = self.member(alias)?;
                let field = member.entity.field(name)?;
                Some(ResolvedField {
                    field: Arc::clone(field),
                    column: format!("{}.{}", member.alias, field.column()),
                })
            }
            None => {
                let view_alias = self.alias(name)?;
                Some(ResolvedField {
                    field: Arc::clone(&view_alias.field),
                    column: format!("{}.{}", view_alias.entity_alias, view_alias.field.column()),
                })
            }
        }
    }

    fn field_names(&self) -> Vec<&str> {
        self.aliases().map(|a| a.name.as_str()).collect()
    }
}
