use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};

use jsonschema::JSONSchema;
use mapforge_core::DatabaseSchema;
use serde_json::Value;

use crate::dialect::KeyDialect;
use crate::errors::{ConfigError, ValidationIssue, ValidationReport, codes};
use crate::model::{CONFIG_VERSION, GeneratorConfig, KeyStrategy, TableRule, Targets};

/// Validated configuration with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: GeneratorConfig,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a configuration document against the configuration JSON Schema.
pub fn validate_config_json(
    config_json: &Value,
    config_schema: &Value,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(config_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                codes::SCHEMA_VIOLATION,
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Validate a parsed configuration against a database schema snapshot.
pub fn validate_config_against_schema(
    config: &GeneratorConfig,
    schema: &DatabaseSchema,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.config_version != CONFIG_VERSION {
        report.push(
            ValidationIssue::error(
                codes::CONFIG_VERSION_MISMATCH,
                "/config_version",
                format!(
                    "config_version '{}' is not supported (expected '{}')",
                    config.config_version, CONFIG_VERSION
                ),
            )
            .with_hint(format!("set config_version = \"{CONFIG_VERSION}\"")),
        );
    }

    validate_targets(&config.targets, &mut report);
    validate_plugins(config, &mut report);

    let schema_index = build_schema_index(schema);
    validate_tables(&config.tables, &schema_index, &mut report);

    report
}

/// Validate the configuration end-to-end, returning structured issues on failure.
pub fn validate_config(
    config_json: &Value,
    config_schema: &Value,
    schema: &DatabaseSchema,
) -> Result<ValidatedConfig, ValidationReport> {
    let structural = match validate_config_json(config_json, config_schema) {
        Ok(report) => report,
        Err(err) => {
            return Err(single_error(codes::SCHEMA_VALIDATION_ERROR, err.to_string()));
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let config: GeneratorConfig = match serde_json::from_value(config_json.clone()) {
        Ok(config) => config,
        Err(err) => return Err(single_error(codes::INVALID_CONFIG_JSON, err.to_string())),
    };

    let schema_report = validate_config_against_schema(&config, schema);
    if !schema_report.is_ok() {
        return Err(schema_report);
    }

    Ok(ValidatedConfig {
        config,
        warnings: schema_report.warnings,
    })
}

fn single_error(code: &str, message: String) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push(ValidationIssue::error(code, "/", message));
    report
}

fn validate_targets(targets: &Targets, report: &mut ValidationReport) {
    for (field, package) in [
        ("model_package", &targets.model_package),
        ("client_package", &targets.client_package),
    ] {
        if !is_valid_package(package) {
            report.push(
                ValidationIssue::error(
                    codes::INVALID_PACKAGE,
                    format!("/targets/{field}"),
                    format!("'{package}' is not a valid package name"),
                )
                .with_hint("use dot-separated identifiers, e.g. com.example.model"),
            );
        }
    }

    for (field, dir) in [
        ("model_dir", &targets.model_dir),
        ("client_dir", &targets.client_dir),
    ] {
        if !is_valid_directory_key(dir) {
            report.push(
                ValidationIssue::error(
                    codes::INVALID_DIRECTORY_KEY,
                    format!("/targets/{field}"),
                    format!("directory key '{dir}' must be a relative path inside the output root"),
                )
                .with_hint("use a path such as src/main/java"),
            );
        }
    }
}

fn validate_plugins(config: &GeneratorConfig, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for (idx, plugin) in config.plugins.iter().enumerate() {
        let path = format!("/plugins/{idx}/id");
        if plugin.id.trim().is_empty() {
            report.push(ValidationIssue::error(
                codes::EMPTY_PLUGIN_ID,
                path,
                "plugin id must be a non-empty string",
            ));
            continue;
        }
        if !seen.insert(plugin.id.as_str()) {
            report.push(
                ValidationIssue::warning(
                    codes::DUPLICATE_PLUGIN,
                    path,
                    format!("plugin '{}' is listed more than once", plugin.id),
                )
                .with_hint("interceptors run once per listing; remove the duplicate"),
            );
        }
    }
}

fn validate_tables(rules: &[TableRule], schema_index: &SchemaIndex, report: &mut ValidationReport) {
    if rules.is_empty() {
        report.push(
            ValidationIssue::error(
                codes::TABLES_EMPTY,
                "/tables",
                "configuration requires at least one table rule",
            )
            .with_hint("add a [[tables]] entry"),
        );
        return;
    }

    let mut seen = HashSet::new();

    for (idx, rule) in rules.iter().enumerate() {
        let base_path = format!("/tables/{idx}");

        let key = format!("{}.{}", rule.schema, rule.table);
        if !seen.insert(key) {
            report.push(
                ValidationIssue::error(
                    codes::DUPLICATE_TABLE_RULE,
                    base_path.clone(),
                    format!("table '{}.{}' has more than one rule", rule.schema, rule.table),
                )
                .with_hint("merge duplicate rules into a single entry"),
            );
        }

        let Some(schema_tables) = schema_index.schemas.get(rule.schema.as_str()) else {
            report.push(ValidationIssue::error(
                codes::UNKNOWN_SCHEMA,
                format!("{base_path}/schema"),
                format!("schema '{}' not found in schema.json", rule.schema),
            ));
            continue;
        };
        let Some(table) = schema_tables.tables.get(rule.table.as_str()) else {
            report.push(ValidationIssue::error(
                codes::UNKNOWN_TABLE,
                format!("{base_path}/table"),
                format!("table '{}.{}' not found in schema.json", rule.schema, rule.table),
            ));
            continue;
        };

        if let Some(name) = &rule.domain_object_name
            && !is_valid_identifier(name)
        {
            report.push(ValidationIssue::error(
                codes::INVALID_DOMAIN_OBJECT_NAME,
                format!("{base_path}/domain_object_name"),
                format!("'{name}' is not a valid type name"),
            ));
        }

        if let Some(root) = &rule.root_interface
            && !is_valid_package(root)
        {
            report.push(ValidationIssue::error(
                codes::INVALID_ROOT_INTERFACE,
                format!("{base_path}/root_interface"),
                format!("'{root}' is not a fully qualified type name"),
            ));
        }

        validate_generated_key(rule, &base_path, table, report);
        validate_columns(rule, &base_path, table, report);
    }
}

fn validate_generated_key(
    rule: &TableRule,
    base_path: &str,
    table: &TableInfo,
    report: &mut ValidationReport,
) {
    let Some(key) = &rule.generated_key else {
        return;
    };
    let key_path = format!("{base_path}/generated_key");

    if !table.columns.contains(key.column.as_str()) {
        // Generation still runs; the key directive is skipped with a warning.
        report.push(ValidationIssue::warning(
            codes::UNKNOWN_KEY_COLUMN,
            format!("{key_path}/column"),
            format!(
                "generated key column '{}' not found on '{}.{}'",
                key.column, rule.schema, rule.table
            ),
        ));
    } else if rule.ignored_columns.contains(&key.column) {
        report.push(
            ValidationIssue::warning(
                codes::IGNORED_KEY_COLUMN,
                format!("{key_path}/column"),
                format!("generated key column '{}' is ignored", key.column),
            )
            .with_hint("remove the column from ignored_columns"),
        );
    }

    match key.strategy {
        KeyStrategy::Jdbc => {
            if key.statement.is_some() || key.timing.is_some() {
                report.push(ValidationIssue::warning(
                    codes::IGNORED_KEY_STATEMENT,
                    key_path,
                    "statement and timing are ignored for the jdbc key strategy",
                ));
            }
        }
        KeyStrategy::Custom => match key.statement.as_deref().map(str::trim) {
            None | Some("") => {
                report.push(
                    ValidationIssue::error(
                        codes::MISSING_KEY_STATEMENT,
                        format!("{key_path}/statement"),
                        "custom key strategy requires a statement",
                    )
                    .with_hint(dialect_hint()),
                );
            }
            // A lone word can only be a dialect name; statements have spaces.
            Some(word)
                if !word.contains(char::is_whitespace) && KeyDialect::from_name(word).is_none() =>
            {
                report.push(
                    ValidationIssue::error(
                        codes::UNKNOWN_KEY_DIALECT,
                        format!("{key_path}/statement"),
                        format!("'{word}' is not a known key dialect"),
                    )
                    .with_hint(dialect_hint()),
                );
            }
            Some(_) => {}
        },
    }
}

fn dialect_hint() -> String {
    format!("use SELECT text or one of: {}", KeyDialect::names().join(", "))
}

fn validate_columns(
    rule: &TableRule,
    base_path: &str,
    table: &TableInfo,
    report: &mut ValidationReport,
) {
    let mut seen = HashSet::new();
    for (idx, column) in rule.columns.iter().enumerate() {
        let path = format!("{base_path}/columns/{idx}");
        if !table.columns.contains(column.column.as_str()) {
            report.push(ValidationIssue::error(
                codes::UNKNOWN_COLUMN,
                format!("{path}/column"),
                format!(
                    "column '{}.{}.{}' not found for override",
                    rule.schema, rule.table, column.column
                ),
            ));
            continue;
        }
        if !seen.insert(column.column.as_str()) {
            report.push(ValidationIssue::error(
                codes::DUPLICATE_COLUMN_OVERRIDE,
                path.clone(),
                format!("column '{}' has more than one override", column.column),
            ));
        }
        if let Some(property) = &column.property
            && !is_valid_identifier(property)
        {
            report.push(ValidationIssue::error(
                codes::INVALID_PROPERTY_NAME,
                format!("{path}/property"),
                format!("'{property}' is not a valid property name"),
            ));
        }
        if rule.ignored_columns.contains(&column.column) {
            report.push(ValidationIssue::warning(
                codes::OVERRIDE_ON_IGNORED_COLUMN,
                path,
                format!("column '{}' is both overridden and ignored", column.column),
            ));
        }
    }

    for (idx, ignored) in rule.ignored_columns.iter().enumerate() {
        let path = format!("{base_path}/ignored_columns/{idx}");
        if !table.columns.contains(ignored.as_str()) {
            report.push(ValidationIssue::warning(
                codes::UNKNOWN_IGNORED_COLUMN,
                path,
                format!(
                    "ignored column '{}.{}.{}' not found",
                    rule.schema, rule.table, ignored
                ),
            ));
        } else if table.primary_key.iter().any(|pk| pk == ignored) {
            report.push(
                ValidationIssue::warning(
                    codes::IGNORED_PRIMARY_KEY_COLUMN,
                    path,
                    format!("primary key column '{ignored}' is ignored"),
                )
                .with_hint("key-based statements lose this column"),
            );
        }
    }
}

fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_valid_package(value: &str) -> bool {
    !value.is_empty() && value.split('.').all(is_valid_identifier)
}

/// Relative, non-empty and free of `..`, so it cannot leave the output root.
fn is_valid_directory_key(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && Path::new(value)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn build_schema_index(schema: &DatabaseSchema) -> SchemaIndex {
    let mut schemas = HashMap::new();

    for schema_entry in &schema.schemas {
        let mut tables = HashMap::new();
        for table in &schema_entry.tables {
            tables.insert(
                table.name.clone(),
                TableInfo {
                    columns: table.columns.iter().map(|c| c.name.clone()).collect(),
                    primary_key: table.primary_key().to_vec(),
                },
            );
        }
        schemas.insert(schema_entry.name.clone(), SchemaTables { tables });
    }

    SchemaIndex { schemas }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

struct SchemaIndex {
    schemas: HashMap<String, SchemaTables>,
}

struct SchemaTables {
    tables: HashMap<String, TableInfo>,
}

struct TableInfo {
    columns: HashSet<String>,
    primary_key: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_and_packages() {
        assert!(is_valid_identifier("Order_1"));
        assert!(!is_valid_identifier("1Order"));
        assert!(!is_valid_identifier(""));
        assert!(is_valid_package("com.example.model"));
        assert!(!is_valid_package("com..model"));
        assert!(!is_valid_package("com.example-model"));
    }

    #[test]
    fn directory_keys_stay_below_the_root() {
        assert!(is_valid_directory_key("src/main/java"));
        assert!(is_valid_directory_key("./generated"));
        assert!(!is_valid_directory_key(""));
        assert!(!is_valid_directory_key("../shared/src"));
        assert!(!is_valid_directory_key("/abs/src"));
    }

    #[test]
    fn empty_pointer_becomes_root() {
        assert_eq!(normalized_json_pointer(""), "/");
        assert_eq!(normalized_json_pointer("/tables/0"), "/tables/0");
    }
}
