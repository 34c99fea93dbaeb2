//! Integration tests for entity and view descriptors.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use quarry::prelude::*;
use quarry::schema::SchemaError;

fn party() -> Arc<EntityDescriptor> {
    Arc::new(
        EntityDescriptor::builder("Party")
            .field(FieldSpec::new("partyId", "id").pk())
            .field(FieldSpec::new("partyTypeId", "id"))
            .field(FieldSpec::new("statusId", "id"))
            .field(FieldSpec::new("createdDate", "date-time"))
            .build(FieldTypeCatalog::builtin())
            .unwrap(),
    )
}

fn person() -> Arc<EntityDescriptor> {
    Arc::new(
        EntityDescriptor::builder("Person")
            .field(FieldSpec::new("partyId", "id").pk())
            .field(FieldSpec::new("firstName", "name"))
            .field(FieldSpec::new("lastName", "name").not_null())
            .field(FieldSpec::new("socialSecurityNumber", "long-varchar").encrypt())
            .build(FieldTypeCatalog::builtin())
            .unwrap(),
    )
}

#[test]
fn test_entity_descriptor_shape() {
    let person = person();

    assert_eq!(person.name(), "Person");
    assert_eq!(person.table_name(), "person");
    assert_eq!(
        person.field_names().collect::<Vec<_>>(),
        ["partyId", "firstName", "lastName", "socialSecurityNumber"]
    );
    assert_eq!(person.field_count(), 4);

    let pk: Vec<_> = person.pk_fields().into_iter().map(|f| f.name()).collect();
    assert_eq!(pk, ["partyId"]);
    assert_eq!(person.no_pk_fields().len(), 3);

    let last = person.field("lastName").unwrap();
    assert_eq!(last.column(), "last_name");
    assert_eq!(last.value_type(), ValueType::String);
    assert_eq!(last.type_name(), "name");
    assert_eq!(last.sql_type(), "VARCHAR(100)");
    assert!(last.not_null);

    assert!(person.has_encrypted_fields());
    assert_eq!(person.field_by_column("FIRST_NAME").unwrap().name(), "firstName");
}

#[test]
fn test_explicit_table_and_columns() {
    let entity = EntityDescriptor::builder("OrderHeader")
        .table("ORDER_HDR")
        .field(FieldSpec::typed("orderId", ValueType::String).column("ORDER_ID").pk())
        .typed_field("grandTotal", ValueType::BigDecimal)
        .build(FieldTypeCatalog::builtin())
        .unwrap();

    assert_eq!(entity.table_name(), "ORDER_HDR");
    assert_eq!(entity.resolve("orderId", None).unwrap().column, "ORDER_ID");
    assert_eq!(entity.resolve("grandTotal", Some("OH")).unwrap().column, "OH.grand_total");
    assert!(entity.resolve("missing", None).is_none());
}

#[test]
fn test_entity_validation_errors() {
    let err = EntityDescriptor::builder("Broken")
        .field(FieldSpec::new("a", "id"))
        .field(FieldSpec::new("a", "id"))
        .build(FieldTypeCatalog::builtin())
        .unwrap_err();
    assert!(matches!(err, SchemaError::Duplicate { .. }), "{:?}", err);

    let err = EntityDescriptor::builder("Broken")
        .field(FieldSpec::new("amount", "money"))
        .build(FieldTypeCatalog::builtin())
        .unwrap_err();
    match err {
        SchemaError::UnknownFieldType { entity, field, type_name } => {
            assert_eq!((entity.as_str(), field.as_str(), type_name.as_str()), ("Broken", "amount", "money"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let err = EntityDescriptor::builder("Broken")
        .field(FieldSpec::new("fooBar", "id"))
        .field(FieldSpec::new("other", "id").column("FOO_BAR"))
        .build(FieldTypeCatalog::builtin())
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidField { .. }), "{:?}", err);

    let err = EntityDescriptor::builder(" ")
        .build(FieldTypeCatalog::builtin())
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidEntity { .. }));
}

#[test]
fn test_entity_errors_are_collected() {
    let err = EntityDescriptor::builder("Broken")
        .field(FieldSpec::new("a", "money"))
        .field(FieldSpec::new("b", "cash"))
        .field(FieldSpec::new("c", "id"))
        .field(FieldSpec::new("c", "id"))
        .build(FieldTypeCatalog::builtin())
        .unwrap_err();

    match err {
        SchemaError::ValidationFailed { count, errors } => {
            assert_eq!(count, 3);
            assert_eq!(errors.len(), 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_view_with_aliases_and_links() {
    let view = ViewDescriptor::builder("PartyAndPerson")
        .member("PTY", party())
        .member("PER", person())
        .alias("PTY", "partyId", None)
        .alias("PTY", "statusId", Some("status"))
        .alias_all("PER", "per")
        .link("PTY", "PER", false, &[("partyId", "partyId")])
        .build()
        .unwrap();

    assert_eq!(view.name(), "PartyAndPerson");
    assert_eq!(
        FieldSource::field_names(&view),
        [
            "partyId",
            "status",
            "perPartyId",
            "perFirstName",
            "perLastName",
            "perSocialSecurityNumber"
        ]
    );
    assert_eq!(view.resolve("status", None).unwrap().column, "PTY.status_id");
    assert_eq!(view.resolve("perLastName", None).unwrap().column, "PER.last_name");
    assert_eq!(view.resolve("createdDate", Some("PTY")).unwrap().column, "PTY.created_date");
    assert!(view.resolve("createdDate", None).is_none());

    let link = &view.links()[0];
    assert_eq!(link.entity_alias, "PTY");
    assert!(!link.optional);
    assert_eq!(link.key_maps[0].rel_field_name, "partyId");
    assert_eq!(view.members().count(), 2);
    assert_eq!(view.member("PER").unwrap().entity.name(), "Person");
}

#[test]
fn test_view_validation_errors() {
    let err = ViewDescriptor::builder("Empty").build().unwrap_err();
    assert!(matches!(err, SchemaError::InvalidView { .. }));

    let err = ViewDescriptor::builder("Unlinked")
        .member("PTY", party())
        .member("PER", person())
        .alias("PTY", "partyId", None)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("Unlinked"), "{}", err);

    let err = ViewDescriptor::builder("BadKey")
        .member("PTY", party())
        .member("PER", person())
        .link("PTY", "PER", true, &[("partyId", "nope")])
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidView { .. }));

    let err = ViewDescriptor::builder("Clash")
        .member("PTY", party())
        .member("PER", person())
        .alias("PTY", "partyId", None)
        .alias("PER", "partyId", None)
        .link("PTY", "PER", false, &[("partyId", "partyId")])
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::Duplicate { .. }));
}

#[test]
fn test_conditions_resolve_through_views() {
    let view = ViewDescriptor::builder("PartyAndPerson")
        .member("PTY", party())
        .member("PER", person())
        .alias("PTY", "statusId", None)
        .alias("PER", "lastName", None)
        .link("PTY", "PER", true, &[("partyId", "partyId")])
        .build()
        .unwrap();

    let condition = Condition::or([
        Condition::eq("statusId", "PARTY_ENABLED"),
        Condition::in_list("lastName", ["Smith", "Jones"]),
    ]);
    let compiled = compile(&condition, &view, &DialectConfig::default()).unwrap();
    assert_eq!(compiled.sql, "(PTY.status_id = ? OR PER.last_name IN (?, ?))");
    assert_eq!(compiled.params.len(), 3);
    assert_eq!(compiled.params[1].field.name(), "lastName");

    let err = compile(&Condition::eq("firstName", "Ann"), &view, &DialectConfig::default()).unwrap_err();
    assert!(err.to_string().contains("firstName"), "{}", err);
}

#[test]
fn test_value_type_aliases() {
    assert_eq!(ValueType::from_name("java.lang.String"), Some(ValueType::String));
    assert_eq!(ValueType::from_name("Timestamp"), Some(ValueType::Timestamp));
    assert_eq!(ValueType::from_name("string"), None);
    assert!(ValueType::Long.is_numeric());
    assert!(ValueType::Date.is_temporal());
    assert!(!ValueType::Blob.is_textual());
}
