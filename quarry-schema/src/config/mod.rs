//! Configuration file parsing for `quarry.toml`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};
use crate::field_type::{FieldTypeCatalog, FieldTypeConfig};

/// Main configuration structure for `quarry.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuarryConfig {
    /// SQL dialect settings.
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Default coercion settings.
    #[serde(default)]
    pub coercion: CoercionConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Additional or overriding field types.
    #[serde(default)]
    pub field_types: IndexMap<String, FieldTypeConfig>,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl QuarryConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        // First, expand environment variables
        let expanded = expand_env_vars(content)?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(dialect) = overrides.dialect {
                dialect.apply(&mut self.dialect);
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_sql) = debug.log_sql {
                    self.debug.log_sql = log_sql;
                }
                if let Some(log_params) = debug.log_params {
                    self.debug.log_params = log_params;
                }
            }
            if let Some(coercion) = overrides.coercion {
                if let Some(fail_on_miss) = coercion.fail_on_miss {
                    self.coercion.fail_on_miss = fail_on_miss;
                }
                if let Some(locale) = coercion.locale {
                    self.coercion.locale = Some(locale);
                }
            }
        }
        self
    }

    /// Built-in field types merged with the `[field_types]` table.
    pub fn field_type_catalog(&self) -> SchemaResult<FieldTypeCatalog> {
        let mut catalog = FieldTypeCatalog::builtin().clone();
        catalog.extend_from_config(&self.field_types)?;
        Ok(catalog)
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.dialect.null_safe_equals.trim().is_empty() {
            return Err(SchemaError::ConfigError {
                message: "dialect.null_safe_equals must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Bind placeholder syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` (SQLite, MySQL, JDBC).
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Dollar,
}

impl PlaceholderStyle {
    /// Render the placeholder for a 1-based parameter index.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", index),
        }
    }
}

/// How member tables of a view are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinStyle {
    /// `a INNER JOIN b ON ...`, nested in parentheses.
    #[default]
    Ansi,
    /// ANSI joins without the nesting parentheses.
    AnsiNoParenthesis,
    /// Comma-separated tables, link predicates in the WHERE clause, `(+)` for
    /// optional links.
    ThetaOracle,
    /// Comma-separated tables, link predicates in the WHERE clause, `*=` for
    /// optional links.
    ThetaMssql,
}

impl JoinStyle {
    /// Whether links are rendered as WHERE predicates.
    pub fn is_theta(&self) -> bool {
        matches!(self, Self::ThetaOracle | Self::ThetaMssql)
    }
}

/// What to do when a literal cannot be coerced to its field's type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMismatchPolicy {
    /// Abort compilation.
    #[default]
    Error,
    /// Log a warning and bind the original value.
    Warn,
}

/// Dialect settings consumed by the SQL compiler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialectConfig {
    /// Placeholder syntax.
    #[serde(default)]
    pub placeholder: PlaceholderStyle,

    /// Native `NULLS FIRST` / `NULLS LAST` support.
    #[serde(default)]
    pub supports_nulls_ordering: bool,

    /// Join rendering for views.
    #[serde(default)]
    pub join_style: JoinStyle,

    /// Select view columns as `ALIAS.col AS field`.
    #[serde(default)]
    pub alias_view_columns: bool,

    /// Render `NOT` as `NOT COALESCE(inner, FALSE)`.
    #[serde(default = "default_true")]
    pub null_safe_negation: bool,

    /// Null-safe equality token used between two columns.
    #[serde(default = "default_null_safe_equals")]
    pub null_safe_equals: String,

    /// Literal type mismatch policy.
    #[serde(default)]
    pub type_mismatch: TypeMismatchPolicy,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderStyle::Question,
            supports_nulls_ordering: false,
            join_style: JoinStyle::Ansi,
            alias_view_columns: false,
            null_safe_negation: true,
            null_safe_equals: default_null_safe_equals(),
            type_mismatch: TypeMismatchPolicy::Error,
        }
    }
}

impl DialectConfig {
    /// Settings for SQLite.
    pub fn sqlite() -> Self {
        Self {
            supports_nulls_ordering: true,
            null_safe_equals: "IS".to_string(),
            ..Self::default()
        }
    }

    /// Settings for PostgreSQL.
    pub fn postgres() -> Self {
        Self {
            placeholder: PlaceholderStyle::Dollar,
            supports_nulls_ordering: true,
            ..Self::default()
        }
    }

    /// Settings for MySQL / MariaDB.
    pub fn mysql() -> Self {
        Self {
            null_safe_equals: "<=>".to_string(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the mismatch policy.
    pub fn with_type_mismatch(mut self, policy: TypeMismatchPolicy) -> Self {
        self.type_mismatch = policy;
        self
    }

    /// Builder-style setter for the join style.
    pub fn with_join_style(mut self, style: JoinStyle) -> Self {
        self.join_style = style;
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_null_safe_equals() -> String {
    "IS NOT DISTINCT FROM".to_string()
}

/// Default coercion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoercionConfig {
    /// Fail instead of returning the original value.
    #[serde(default = "default_true")]
    pub fail_on_miss: bool,

    /// Locale used for number parsing (`de_DE`).
    #[serde(default)]
    pub locale: Option<String>,

    /// Date format (chrono syntax).
    #[serde(default)]
    pub date_format: Option<String>,

    /// Time format (chrono syntax).
    #[serde(default)]
    pub time_format: Option<String>,

    /// Timestamp format (chrono syntax).
    #[serde(default)]
    pub timestamp_format: Option<String>,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            fail_on_miss: true,
            locale: None,
            date_format: None,
            time_format: None,
            timestamp_format: None,
        }
    }
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log compiled SQL.
    #[serde(default)]
    pub log_sql: bool,

    /// Log bound parameter values.
    #[serde(default)]
    pub log_params: bool,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Dialect overrides.
    pub dialect: Option<DialectOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,

    /// Coercion overrides.
    pub coercion: Option<CoercionOverride>,
}

/// Dialect configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialectOverride {
    /// Override placeholder.
    pub placeholder: Option<PlaceholderStyle>,

    /// Override supports_nulls_ordering.
    pub supports_nulls_ordering: Option<bool>,

    /// Override join_style.
    pub join_style: Option<JoinStyle>,

    /// Override null_safe_negation.
    pub null_safe_negation: Option<bool>,

    /// Override type_mismatch.
    pub type_mismatch: Option<TypeMismatchPolicy>,
}

impl DialectOverride {
    fn apply(self, dialect: &mut DialectConfig) {
        if let Some(placeholder) = self.placeholder {
            dialect.placeholder = placeholder;
        }
        if let Some(nulls) = self.supports_nulls_ordering {
            dialect.supports_nulls_ordering = nulls;
        }
        if let Some(join_style) = self.join_style {
            dialect.join_style = join_style;
        }
        if let Some(negation) = self.null_safe_negation {
            dialect.null_safe_negation = negation;
        }
        if let Some(policy) = self.type_mismatch {
            dialect.type_mismatch = policy;
        }
    }
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_sql.
    pub log_sql: Option<bool>,

    /// Override log_params.
    pub log_params: Option<bool>,
}

/// Coercion configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoercionOverride {
    /// Override fail_on_miss.
    pub fail_on_miss: Option<bool>,

    /// Override locale.
    pub locale: Option<String>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> SchemaResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}").map_err(|e| SchemaError::ConfigError {
        message: e.to_string(),
    })?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn test_default_config() {
        let config = QuarryConfig::default();
        assert_eq!(config.dialect.placeholder, PlaceholderStyle::Question);
        assert_eq!(config.dialect.join_style, JoinStyle::Ansi);
        assert!(config.dialect.null_safe_negation);
        assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Error);
        assert!(config.coercion.fail_on_miss);
        assert!(!config.debug.log_sql);
    }

    #[test]
    fn test_parse_dialect() {
        let toml = r#"
            [dialect]
            placeholder = "dollar"
            join_style = "theta-oracle"
            type_mismatch = "warn"
        "#;

        let config = QuarryConfig::from_str(toml).unwrap();
        assert_eq!(config.dialect.placeholder, PlaceholderStyle::Dollar);
        assert_eq!(config.dialect.join_style, JoinStyle::ThetaOracle);
        assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Warn);
        assert_eq!(config.dialect.null_safe_equals, "IS NOT DISTINCT FROM");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let toml = r#"
            [dialect]
            placeholders = "dollar"
        "#;
        let err = QuarryConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_empty_null_safe_equals_rejected() {
        let toml = r#"
            [dialect]
            null_safe_equals = "  "
        "#;
        let err = QuarryConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, SchemaError::ConfigError { .. }));
    }

    #[test]
    fn test_field_types_table() {
        let toml = r#"
            [field_types.tiny-id]
            java_type = "String"
            sql_type = "VARCHAR(5)"
        "#;
        let config = QuarryConfig::from_str(toml).unwrap();
        let catalog = config.field_type_catalog().unwrap();
        let ft = catalog.get("tiny-id").unwrap();
        assert_eq!(ft.java_type, ValueType::String);
        assert!(catalog.contains("long-varchar"));
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [debug]
            log_sql = false

            [environments.production.dialect]
            placeholder = "dollar"
            type_mismatch = "warn"

            [environments.production.debug]
            log_sql = true
        "#;
        let config = QuarryConfig::from_str(toml)
            .unwrap()
            .with_environment("production");
        assert_eq!(config.dialect.placeholder, PlaceholderStyle::Dollar);
        assert_eq!(config.dialect.type_mismatch, TypeMismatchPolicy::Warn);
        assert!(config.debug.log_sql);
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(PlaceholderStyle::Question.placeholder(3), "?");
        assert_eq!(PlaceholderStyle::Dollar.placeholder(3), "$3");
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: This test runs single-threaded and we clean up after
        unsafe {
            std::env::set_var("QUARRY_TEST_LOCALE", "de_DE");
        }
        let expanded = expand_env_vars("locale = \"${QUARRY_TEST_LOCALE}\"").unwrap();
        assert_eq!(expanded, "locale = \"de_DE\"");
        unsafe {
            std::env::remove_var("QUARRY_TEST_LOCALE");
        }
    }
}
