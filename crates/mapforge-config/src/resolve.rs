use mapforge_core::{
    Column, ColumnDescriptor, DatabaseSchema, FullyQualifiedTable, GeneratedKey, IdentityGeneration,
    JavaType, KeyTiming, Table, TableDescriptor,
};
use tracing::{debug, warn};

use crate::dialect::KeyDialect;
use crate::errors::{ValidationIssue, ValidationReport, codes};
use crate::model::{ColumnOverride, GeneratedKeyRule, GeneratorConfig, KeyStrategy, TableRule};
use crate::type_resolver::{ResolvedType, is_blob_jdbc_type, resolve_column_type};

/// Combine the configuration with the schema snapshot into table descriptors.
///
/// Descriptors come back in configuration order. Rules whose table is missing
/// from the snapshot are skipped with an error issue; type and key gaps become
/// warnings and the table is still produced.
pub fn resolve_tables(
    config: &GeneratorConfig,
    schema: &DatabaseSchema,
) -> (Vec<TableDescriptor>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut tables = Vec::with_capacity(config.tables.len());

    for (idx, rule) in config.tables.iter().enumerate() {
        let base_path = format!("/tables/{idx}");
        let Some(table) = schema.table(&rule.schema, &rule.table) else {
            report.push(ValidationIssue::error(
                codes::UNKNOWN_TABLE,
                format!("{base_path}/table"),
                format!("table '{}.{}' not found in schema.json", rule.schema, rule.table),
            ));
            continue;
        };

        let descriptor = resolve_table(config, rule, table, &base_path, &mut report);
        debug!(
            schema = %rule.schema,
            table = %rule.table,
            columns = descriptor.columns().len(),
            "resolved table"
        );
        tables.push(descriptor);
    }

    (tables, report)
}

fn resolve_table(
    config: &GeneratorConfig,
    rule: &TableRule,
    table: &Table,
    base_path: &str,
    report: &mut ValidationReport,
) -> TableDescriptor {
    let mut identity = FullyQualifiedTable::new(None, Some(&rule.schema), &rule.table);
    if let Some(name) = &rule.domain_object_name {
        identity = identity.with_domain_object_name(name);
    }

    let mut snapshot_columns: Vec<&Column> = table
        .columns
        .iter()
        .filter(|column| !rule.ignored_columns.contains(&column.name))
        .collect();
    snapshot_columns.sort_by_key(|column| column.ordinal_position);

    let columns = snapshot_columns
        .into_iter()
        .map(|column| resolve_column(config, rule, column, base_path, report))
        .collect();

    let primary_key = table
        .primary_key()
        .iter()
        .filter(|name| !rule.ignored_columns.contains(name))
        .cloned()
        .collect();

    let mut descriptor = TableDescriptor::new(identity, columns, primary_key)
        .with_statements(rule.statements.clone())
        .with_model_only(rule.model_only)
        .with_constructor_based(rule.constructor_based)
        .with_packages(&config.targets.model_package, &config.targets.client_package);

    if let Some(root) = &rule.root_interface {
        descriptor = descriptor.with_root_interface(JavaType::new(root));
    }

    if let Some(key_rule) = &rule.generated_key
        && let Some(key) = resolve_generated_key(key_rule, base_path, report)
    {
        descriptor = descriptor.with_generated_key(key);
    }

    descriptor
}

fn resolve_column(
    config: &GeneratorConfig,
    rule: &TableRule,
    column: &Column,
    base_path: &str,
    report: &mut ValidationReport,
) -> ColumnDescriptor {
    let column_override = rule.columns.iter().find(|o| o.column == column.name);

    let mut resolved = match resolve_column_type(&column.column_type, &config.options) {
        Some(resolved) => resolved,
        None if column_override.is_some_and(|o| o.java_type.is_some()) => ResolvedType::fallback(),
        None => {
            warn!(
                schema = %rule.schema,
                table = %rule.table,
                column = %column.name,
                data_type = %column.column_type.data_type,
                "no type mapping; falling back to Object"
            );
            report.push(
                ValidationIssue::warning(
                    codes::INTROSPECTION_GAP,
                    base_path,
                    format!(
                        "column '{}' has unmapped type '{}'; using java.lang.Object",
                        column.name, column.column_type.data_type
                    ),
                )
                .with_hint("add a column override with java_type and jdbc_type"),
            );
            ResolvedType::fallback()
        }
    };

    if let Some(column_override) = column_override {
        apply_type_override(&mut resolved, column_override);
    }

    let mut descriptor =
        ColumnDescriptor::new(&column.name, resolved.java_type, &resolved.jdbc_type);
    if !column.is_nullable {
        descriptor = descriptor.not_null();
    }
    if resolved.blob {
        descriptor = descriptor.blob();
    }
    if column.identity.is_some() {
        descriptor = descriptor.identity();
    }
    if column.generated.is_some() || column.identity == Some(IdentityGeneration::Always) {
        descriptor = descriptor.generated_always();
    }

    if let Some(column_override) = column_override {
        if let Some(property) = &column_override.property {
            descriptor = descriptor.with_property(property);
        }
        if let Some(handler) = &column_override.type_handler {
            descriptor = descriptor.with_type_handler(handler);
        }
        if let Some(generated_always) = column_override.generated_always {
            descriptor.generated_always = generated_always;
        }
    }

    descriptor
}

fn apply_type_override(resolved: &mut ResolvedType, column_override: &ColumnOverride) {
    if let Some(java_type) = &column_override.java_type {
        resolved.java_type = JavaType::new(java_type);
    }
    if let Some(jdbc_type) = &column_override.jdbc_type {
        resolved.jdbc_type = jdbc_type.to_ascii_uppercase();
        resolved.blob = is_blob_jdbc_type(&resolved.jdbc_type);
    }
    if let Some(blob) = column_override.blob {
        resolved.blob = blob;
    }
}

/// Translate the configured key rule. A named dialect supplies its identity
/// statement and defaults to `after`; any other text is a sequence-style
/// statement defaulting to `before`.
pub fn resolve_generated_key(
    rule: &GeneratedKeyRule,
    base_path: &str,
    report: &mut ValidationReport,
) -> Option<GeneratedKey> {
    match rule.strategy {
        KeyStrategy::Jdbc => Some(GeneratedKey::JdbcStandard {
            column: rule.column.clone(),
        }),
        KeyStrategy::Custom => {
            let Some(statement) = rule.statement.as_deref().map(str::trim).filter(|s| !s.is_empty())
            else {
                report.push(ValidationIssue::error(
                    codes::MISSING_KEY_STATEMENT,
                    format!("{base_path}/generated_key/statement"),
                    "custom key strategy requires a statement",
                ));
                return None;
            };

            let (statement, default_timing) = match KeyDialect::from_name(statement) {
                Some(dialect) => (dialect.identity_statement().to_string(), KeyTiming::After),
                None => (statement.to_string(), KeyTiming::Before),
            };

            Some(GeneratedKey::CustomSelect {
                column: rule.column.clone(),
                statement,
                timing: rule.timing.unwrap_or(default_timing),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_rule(strategy: KeyStrategy, statement: Option<&str>, timing: Option<KeyTiming>) -> GeneratedKeyRule {
        GeneratedKeyRule {
            column: "id".to_string(),
            strategy,
            statement: statement.map(str::to_string),
            timing,
        }
    }

    #[test]
    fn dialect_names_expand_to_identity_statements() {
        let mut report = ValidationReport::default();
        let key = resolve_generated_key(
            &key_rule(KeyStrategy::Custom, Some("MySql"), None),
            "/tables/0",
            &mut report,
        );
        assert_eq!(
            key,
            Some(GeneratedKey::CustomSelect {
                column: "id".to_string(),
                statement: "SELECT LAST_INSERT_ID()".to_string(),
                timing: KeyTiming::After,
            })
        );
        assert!(report.is_ok());
    }

    #[test]
    fn raw_statements_default_to_sequence_timing() {
        let mut report = ValidationReport::default();
        let key = resolve_generated_key(
            &key_rule(KeyStrategy::Custom, Some("select nextval('orders_seq')"), None),
            "/tables/0",
            &mut report,
        )
        .expect("key");
        assert!(!key.is_identity());

        let explicit = resolve_generated_key(
            &key_rule(KeyStrategy::Custom, Some("select currval('s')"), Some(KeyTiming::After)),
            "/tables/0",
            &mut report,
        )
        .expect("key");
        assert!(explicit.is_identity());
    }

    #[test]
    fn custom_key_without_statement_is_an_error() {
        let mut report = ValidationReport::default();
        let key = resolve_generated_key(
            &key_rule(KeyStrategy::Custom, Some("  "), None),
            "/tables/3",
            &mut report,
        );
        assert!(key.is_none());
        assert_eq!(report.errors[0].code, codes::MISSING_KEY_STATEMENT);
        assert_eq!(report.errors[0].path, "/tables/3/generated_key/statement");
    }
}
