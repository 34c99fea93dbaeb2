//! Integration tests for `quarry.toml` loading and its effect on compilation.

use pretty_assertions::assert_eq;

use quarry::prelude::*;
use quarry::query::{Coercer, logging};
use quarry::schema::{JoinStyle, PlaceholderStyle, SchemaError, TypeMismatchPolicy};

const FULL: &str = r#"
    [dialect]
    placeholder = "dollar"
    supports_nulls_ordering = true
    join_style = "ansi-no-parenthesis"
    null_safe_equals = "IS NOT DISTINCT FROM"
    type_mismatch = "warn"

    [coercion]
    fail_on_miss = false
    locale = "de_DE"
    date_format = "%d.%m.%Y"

    [debug]
    log_sql = true
    log_params = true

    [field_types.tiny-id]
    java_type = "String"
    sql_type = "VARCHAR(5)"

    [field_types.amount]
    java_type = "java.math.BigDecimal"
    sql_type = "DECIMAL(18,2)"
    sql_type_alias = "NUMERIC(18,2)"

    [environments.test.dialect]
    placeholder = "question"
    type_mismatch = "error"

    [environments.test.debug]
    log_params = false

    [environments.test.coercion]
    fail_on_miss = true
"#;

fn person(catalog: &FieldTypeCatalog) -> EntityDescriptor {
    EntityDescriptor::builder("Person")
        .field(FieldSpec::new("partyId", "tiny-id").pk())
        .field(FieldSpec::new("firstName", "name"))
        .typed_field("age", ValueType::Long)
        .field(FieldSpec::new("salary", "amount"))
        .build(catalog)
        .unwrap()
}

#[test]
fn test_config_minimal() {
    let config = QuarryConfig::from_str("").unwrap();
    assert_eq!(config.dialect.placeholder, PlaceholderStyle::Question);
    assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Error);
    assert!(config.coercion.fail_on_miss);
    assert!(!config.debug.log_sql);
    assert_eq!(config.field_type_catalog().unwrap(), *FieldTypeCatalog::builtin());
}

#[test]
fn test_config_full() {
    let config = QuarryConfig::from_str(FULL).unwrap();

    assert_eq!(config.dialect.placeholder, PlaceholderStyle::Dollar);
    assert!(config.dialect.supports_nulls_ordering);
    assert_eq!(config.dialect.join_style, JoinStyle::AnsiNoParenthesis);
    assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Warn);
    assert!(!config.coercion.fail_on_miss);
    assert_eq!(config.coercion.locale.as_deref(), Some("de_DE"));
    assert!(config.debug.log_sql);
    assert!(config.debug.log_params);

    let catalog = config.field_type_catalog().unwrap();
    let tiny = catalog.get("tiny-id").unwrap();
    assert_eq!(tiny.java_type, ValueType::String);
    assert_eq!(tiny.sql_type, "VARCHAR(5)");
    let amount = catalog.get("amount").unwrap();
    assert_eq!(amount.java_type, ValueType::BigDecimal);
    assert_eq!(amount.sql_type_alias.as_deref(), Some("NUMERIC(18,2)"));
    assert!(catalog.contains("long-varchar"));
}

#[test]
fn test_environment_overrides() {
    let config = QuarryConfig::from_str(FULL).unwrap().with_environment("test");

    assert_eq!(config.dialect.placeholder, PlaceholderStyle::Question);
    assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Error);
    assert!(config.dialect.supports_nulls_ordering);
    assert!(config.debug.log_sql);
    assert!(!config.debug.log_params);
    assert!(config.coercion.fail_on_miss);
    assert!(config.environments.is_empty());

    let unchanged = QuarryConfig::from_str(FULL).unwrap().with_environment("production");
    assert_eq!(unchanged.dialect.placeholder, PlaceholderStyle::Dollar);
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quarry.toml");
    std::fs::write(&path, FULL).unwrap();

    let config = QuarryConfig::from_file(&path).unwrap();
    assert_eq!(config.dialect.placeholder, PlaceholderStyle::Dollar);

    let missing = QuarryConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, SchemaError::IoError { .. }));
}

#[test]
fn test_env_var_expansion() {
    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var("QUARRY_TEST_NULL_SAFE_EQUALS", "<=>") };

    let config = QuarryConfig::from_str(
        r#"
        [dialect]
        null_safe_equals = "${QUARRY_TEST_NULL_SAFE_EQUALS}"
        "#,
    )
    .unwrap();
    assert_eq!(config.dialect.null_safe_equals, "<=>");
}

#[test]
fn test_invalid_configs() {
    let unknown_key = QuarryConfig::from_str("[dialect]\nplaceholders = \"dollar\"").unwrap_err();
    assert!(matches!(unknown_key, SchemaError::TomlError { .. }));

    let bad_enum = QuarryConfig::from_str("[dialect]\njoin_style = \"sideways\"").unwrap_err();
    assert!(matches!(bad_enum, SchemaError::TomlError { .. }));

    let empty_equals = QuarryConfig::from_str("[dialect]\nnull_safe_equals = \" \"").unwrap_err();
    assert!(matches!(empty_equals, SchemaError::ConfigError { .. }));

    let config = QuarryConfig::from_str(
        r#"
        [field_types.weird]
        java_type = "Quaternion"
        sql_type = "BLOB"
        "#,
    )
    .unwrap();
    assert!(config.field_type_catalog().is_err());
}

#[test]
fn test_dialect_shapes_compiled_sql() {
    let config = QuarryConfig::from_str(FULL).unwrap();
    let catalog = config.field_type_catalog().unwrap();
    let person = person(&catalog);

    let condition = Condition::and([
        Condition::eq("firstName", "Ann"),
        Condition::compare_fields("partyId", ComparisonOperator::Equals, "firstName"),
        Condition::ne("age", 30i64),
    ]);

    let compiled = compile(&condition, &person, &config.dialect).unwrap();
    assert_eq!(
        compiled.sql,
        "(first_name = $1 AND party_id IS NOT DISTINCT FROM first_name AND (age <> $2 OR age IS NULL))"
    );
    assert_eq!(compiled.placeholder_count(), 2);

    let compiled = compile(&condition, &person, &DialectConfig::mysql()).unwrap();
    assert_eq!(
        compiled.sql,
        "(first_name = ? AND party_id <=> first_name AND (age <> ? OR age IS NULL))"
    );
}

#[test]
fn test_type_mismatch_policy_from_config() {
    let strict = QuarryConfig::from_str(FULL).unwrap().with_environment("test");
    let person = person(&strict.field_type_catalog().unwrap());
    let condition = Condition::eq("age", "not a number");

    let err = compile(&condition, &person, &strict.dialect).unwrap_err();
    assert!(err.to_string().contains("age"), "{}", err);

    let lenient = QuarryConfig::from_str(FULL).unwrap();
    let compiled = compile(&condition, &person, &lenient.dialect).unwrap();
    assert_eq!(compiled.sql, "age = $1");
}

#[test]
fn test_coercer_from_config() {
    let config = QuarryConfig::from_str(FULL).unwrap();
    let coercer = Coercer::from_config(&config.coercion).unwrap();
    assert!(!coercer.fail_on_miss());

    assert_eq!(
        coercer.coerce(Value::from("1.234,5"), ValueType::Double).unwrap(),
        Value::Float(1234.5)
    );
    assert_eq!(
        coercer.coerce(Value::from("24.12.2025"), ValueType::Date).unwrap(),
        Value::Date(chrono::NaiveDate::from_ymd_opt(2025, 12, 24).unwrap())
    );
    // Lenient mode hands back the original value.
    assert_eq!(
        coercer.coerce(Value::from("soon"), ValueType::Date).unwrap(),
        Value::from("soon")
    );

    let strict = Coercer::from_config(&config.with_environment("test").coercion).unwrap();
    assert!(strict.coerce(Value::from("soon"), ValueType::Date).is_err());

    let bad_locale = QuarryConfig::from_str("[coercion]\nlocale = \"_\"").unwrap();
    assert!(Coercer::from_config(&bad_locale.coercion).is_err());
}

#[test]
fn test_debug_section_controls_sql_logging() {
    let config = QuarryConfig::from_str(FULL).unwrap();
    logging::apply_config(&config.debug);
    assert!(logging::log_sql_enabled());
    assert!(logging::log_params_enabled());

    let quiet = QuarryConfig::from_str("[debug]\nlog_params = true").unwrap();
    logging::apply_config(&quiet.debug);
    assert!(!logging::log_params_enabled());
}
