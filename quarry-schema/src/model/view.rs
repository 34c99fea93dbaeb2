//! View descriptors: read-only entities assembled from joined member entities.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::entity::EntityDescriptor;
use super::field::FieldDescriptor;
use crate::error::{SchemaError, SchemaResult};

/// A member entity of a view and the alias it is joined under.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewMember {
    /// Table alias (`PTY`).
    pub alias: SmolStr,
    /// Member entity.
    pub entity: Arc<EntityDescriptor>,
}

/// A view field mapped onto a member entity's field.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAlias {
    /// Field name exposed by the view.
    pub name: SmolStr,
    /// Alias of the member entity.
    pub entity_alias: SmolStr,
    /// Member field backing the alias.
    pub field: Arc<FieldDescriptor>,
}

/// One `field = rel_field` pair of a view link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    /// Field on the left member.
    pub field_name: SmolStr,
    /// Field on the right member.
    pub rel_field_name: SmolStr,
}

/// A join between two members.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLink {
    /// Left member alias.
    pub entity_alias: SmolStr,
    /// Right member alias.
    pub rel_entity_alias: SmolStr,
    /// Outer join when the right side may be missing.
    pub optional: bool,
    /// Join keys.
    pub key_maps: Vec<KeyMap>,
}

/// Read-only description of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDescriptor {
    name: SmolStr,
    members: IndexMap<SmolStr, ViewMember>,
    aliases: IndexMap<SmolStr, ViewAlias>,
    links: Vec<ViewLink>,
}

impl ViewDescriptor {
    /// Start building a view.
    pub fn builder(name: impl Into<SmolStr>) -> ViewBuilder {
        ViewBuilder::new(name)
    }

    /// Get the view name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a member by alias.
    pub fn member(&self, alias: &str) -> Option<&ViewMember> {
        self.members.get(alias)
    }

    /// Members in declaration order. The first member anchors the joins.
    pub fn members(&self) -> impl Iterator<Item = &ViewMember> {
        self.members.values()
    }

    /// Look up an aliased field.
    pub fn alias(&self, name: &str) -> Option<&ViewAlias> {
        self.aliases.get(name)
    }

    /// Aliased fields in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = &ViewAlias> {
        self.aliases.values()
    }

    /// Links in declaration order.
    pub fn links(&self) -> &[ViewLink] {
        &self.links
    }
}

#[derive(Debug, Clone)]
enum AliasSpec {
    One {
        entity_alias: SmolStr,
        field: SmolStr,
        name: Option<SmolStr>,
    },
    All {
        entity_alias: SmolStr,
        prefix: SmolStr,
    },
}

/// Builder for [`ViewDescriptor`].
#[derive(Debug, Clone)]
pub struct ViewBuilder {
    name: SmolStr,
    members: Vec<ViewMember>,
    aliases: Vec<AliasSpec>,
    links: Vec<ViewLink>,
}

impl ViewBuilder {
    /// Create a builder for the named view.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            aliases: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Add a member entity under an alias.
    pub fn member(mut self, alias: impl Into<SmolStr>, entity: Arc<EntityDescriptor>) -> Self {
        self.members.push(ViewMember {
            alias: alias.into(),
            entity,
        });
        self
    }

    /// Expose one member field, optionally under another name.
    pub fn alias(
        mut self,
        entity_alias: impl Into<SmolStr>,
        field: impl Into<SmolStr>,
        name: Option<&str>,
    ) -> Self {
        self.aliases.push(AliasSpec::One {
            entity_alias: entity_alias.into(),
            field: field.into(),
            name: name.map(SmolStr::new),
        });
        self
    }

    /// Expose every field of a member, prefixing the names.
    pub fn alias_all(mut self, entity_alias: impl Into<SmolStr>, prefix: &str) -> Self {
        self.aliases.push(AliasSpec::All {
            entity_alias: entity_alias.into(),
            prefix: SmolStr::new(prefix),
        });
        self
    }

    /// Join two members.
    pub fn link(
        mut self,
        entity_alias: impl Into<SmolStr>,
        rel_entity_alias: impl Into<SmolStr>,
        optional: bool,
        keys: &[(&str, &str)],
    ) -> Self {
        self.links.push(ViewLink {
            entity_alias: entity_alias.into(),
            rel_entity_alias: rel_entity_alias.into(),
            optional,
            key_maps: keys
                .iter()
                .map(|(f, rf)| KeyMap {
                    field_name: SmolStr::new(f),
                    rel_field_name: SmolStr::new(rf),
                })
                .collect(),
        });
        self
    }

    /// Validate and build the view.
    pub fn build(self) -> SchemaResult<ViewDescriptor> {
        let view = self.name.clone();
        let mut errors = Vec::new();

        let mut members = IndexMap::new();
        for member in self.members {
            if members.contains_key(&member.alias) {
                errors.push(SchemaError::duplicate(
                    "member alias",
                    format!("{}.{}", view, member.alias),
                ));
                continue;
            }
            members.insert(member.alias.clone(), member);
        }
        if members.is_empty() {
            errors.push(SchemaError::invalid_view(view.as_str(), "a view needs at least one member"));
        }

        let mut aliases = IndexMap::new();
        let mut add_alias = |name: SmolStr, entity_alias: &SmolStr, field: Arc<FieldDescriptor>| {
            if aliases.contains_key(&name) {
                return Err(SchemaError::duplicate("view field", format!("{}.{}", view, name)));
            }
            aliases.insert(
                name.clone(),
                ViewAlias {
                    name,
                    entity_alias: entity_alias.clone(),
                    field,
                },
            );
            Ok(())
        };

        for spec in self.aliases {
            match spec {
                AliasSpec::One {
                    entity_alias,
                    field,
                    name,
                } => {
                    let Some(member) = members.get(&entity_alias) else {
                        errors.push(SchemaError::invalid_view(
                            view.as_str(),
                            format!("alias refers to unknown member `{}`", entity_alias),
                        ));
                        continue;
                    };
                    let Some(descriptor) = member.entity.field(&field) else {
                        errors.push(SchemaError::invalid_view(
                            view.as_str(),
                            format!("member `{}` has no field `{}`", entity_alias, field),
                        ));
                        continue;
                    };
                    let name = name.unwrap_or(field);
                    if let Err(err) = add_alias(name, &entity_alias, Arc::clone(descriptor)) {
                        errors.push(err);
                    }
                }
                AliasSpec::All {
                    entity_alias,
                    prefix,
                } => {
                    let Some(member) = members.get(&entity_alias) else {
                        errors.push(SchemaError::invalid_view(
                            view.as_str(),
                            format!("alias-all refers to unknown member `{}`", entity_alias),
                        ));
                        continue;
                    };
                    for descriptor in member.entity.fields() {
                        let name = prefixed_name(&prefix, descriptor.name());
                        if let Err(err) = add_alias(name, &entity_alias, Arc::clone(descriptor)) {
                            errors.push(err);
                        }
                    }
                }
            }
        }

        let mut linked: HashSet<&SmolStr> = HashSet::new();
        if let Some(first) = members.keys().next() {
            linked.insert(first);
        }
        for link in &self.links {
            let left = members.get(&link.entity_alias);
            let right = members.get(&link.rel_entity_alias);
            let (Some(left), Some(right)) = (left, right) else {
                errors.push(SchemaError::invalid_view(
                    view.as_str(),
                    format!(
                        "link `{}` -> `{}` refers to an unknown member",
                        link.entity_alias, link.rel_entity_alias
                    ),
                ));
                continue;
            };
            if link.key_maps.is_empty() {
                errors.push(SchemaError::invalid_view(
                    view.as_str(),
                    format!(
                        "link `{}` -> `{}` has no key maps",
                        link.entity_alias, link.rel_entity_alias
                    ),
                ));
            }
            for key in &link.key_maps {
                if !left.entity.has_field(&key.field_name)
                    || !right.entity.has_field(&key.rel_field_name)
                {
                    errors.push(SchemaError::invalid_view(
                        view.as_str(),
                        format!(
                            "key map {}.{} = {}.{} refers to an unknown field",
                            link.entity_alias,
                            key.field_name,
                            link.rel_entity_alias,
                            key.rel_field_name
                        ),
                    ));
                }
            }
            linked.insert(&left.alias);
            linked.insert(&right.alias);
        }
        for alias in members.keys() {
            if !linked.contains(alias) {
                errors.push(SchemaError::invalid_view(
                    view.as_str(),
                    format!("member `{}` is not linked to the view", alias),
                ));
            }
        }

        if let Some(err) = SchemaError::collect(errors) {
            return Err(err);
        }

        Ok(ViewDescriptor {
            name: self.name,
            members,
            aliases,
            links: self.links,
        })
    }
}

/// `prefix` + capitalised field name, or the bare name without a prefix.
fn prefixed_name(prefix: &str, field: &str) -> SmolStr {
    if prefix.is_empty() {
        return SmolStr::new(field);
    }
    let mut chars = field.chars();
    let mut out = String::with_capacity(prefix.len() + field.len());
    out.push_str(prefix);
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    SmolStr::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldTypeCatalog;
    use crate::model::FieldSpec;

    fn party() -> Arc<EntityDescriptor> {
        Arc::new(
            EntityDescriptor::builder("Party")
                .field(FieldSpec::new("partyId", "id").pk())
                .field(FieldSpec::new("statusId", "id"))
                .build(FieldTypeCatalog::builtin())
                .unwrap(),
        )
    }

    fn person() -> Arc<EntityDescriptor> {
        Arc::new(
            EntityDescriptor::builder("Person")
                .field(FieldSpec::new("partyId", "id").pk())
                .field(FieldSpec::new("firstName", "name"))
                .build(FieldTypeCatalog::builtin())
                .unwrap(),
        )
    }

    #[test]
    fn test_build_view() {
        let view = ViewDescriptor::builder("PartyAndPerson")
            .member("PTY", party())
            .member("PER", person())
            .alias_all("PTY", "")
            .alias("PER", "firstName", None)
            .link("PTY", "PER", true, &[("partyId", "partyId")])
            .build()
            .unwrap();

        assert_eq!(view.name(), "PartyAndPerson");
        assert_eq!(view.members().count(), 2);
        let names: Vec<_> = view.aliases().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["partyId", "statusId", "firstName"]);
        assert_eq!(view.alias("firstName").unwrap().entity_alias, "PER");
        assert!(view.links()[0].optional);
    }

    #[test]
    fn test_alias_all_with_prefix() {
        let view = ViewDescriptor::builder("PartyView")
            .member("PTY", party())
            .alias_all("PTY", "party")
            .build()
            .unwrap();
        assert!(view.alias("partyPartyId").is_some());
        assert!(view.alias("partyStatusId").is_some());
    }

    #[test]
    fn test_unlinked_member() {
        let err = ViewDescriptor::builder("Broken")
            .member("PTY", party())
            .member("PER", person())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_duplicate_alias() {
        let err = ViewDescriptor::builder("Dup")
            .member("PTY", party())
            .member("PER", person())
            .alias_all("PTY", "")
            .alias_all("PER", "")
            .link("PTY", "PER", false, &[("partyId", "partyId")])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { .. }));
    }

    #[test]
    fn test_bad_key_map() {
        let err = ViewDescriptor::builder("BadKeys")
            .member("PTY", party())
            .member("PER", person())
            .link("PTY", "PER", false, &[("partyId", "nope")])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidView { .. }));
    }
}
