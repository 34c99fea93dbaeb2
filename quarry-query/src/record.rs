//! Name to value lookups evaluated by the matcher.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;

use quarry_schema::EntityDescriptor;

use crate::coerce::Coercer;
use crate::error::QueryResult;
use crate::value::Value;

/// A record whose fields are looked up by logical name.
///
/// Absent fields read as null.
pub trait Record {
    /// The value of a field, if present.
    fn get(&self, name: &str) -> Option<&Value>;

    /// The value of a field, null when absent.
    fn value(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&Value::Null)
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<&Value> {
        HashMap::get(self, name)
    }
}

impl Record for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<&Value> {
        BTreeMap::get(self, name)
    }
}

impl<S: BuildHasher> Record for IndexMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<&Value> {
        IndexMap::get(self, name)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn get(&self, name: &str) -> Option<&Value> {
        (**self).get(name)
    }
}

/// Coerce the entity's fields found in `record` to their declared types.
///
/// Fields the entity does not declare are dropped; declared fields missing
/// from the record are left out. Output follows the entity's field order.
pub fn coerce_record(
    entity: &EntityDescriptor,
    record: &dyn Record,
    coercer: &Coercer,
) -> QueryResult<IndexMap<String, Value>> {
    let mut typed = IndexMap::with_capacity(entity.field_count());
    for field in entity.fields() {
        if let Some(value) = record.get(field.name()) {
            let value = coercer
                .coerce_for(value.clone(), field)
                .map_err(|e| e.with_entity(entity.name()).with_field(field.name()))?;
            typed.insert(field.name().to_string(), value);
        }
    }
    Ok(typed)
}
