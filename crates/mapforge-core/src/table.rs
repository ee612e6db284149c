use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::java_type::JavaType;
use crate::naming::{domain_object_name, property_name, valid_property_name};

/// Catalog/schema/table identity plus the domain object name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullyQualifiedTable {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
    pub domain_object_name: String,
}

impl FullyQualifiedTable {
    pub fn new(catalog: Option<&str>, schema: Option<&str>, name: &str) -> Self {
        Self {
            catalog: catalog.map(str::to_string),
            schema: schema.map(str::to_string),
            name: name.to_string(),
            domain_object_name: domain_object_name(name),
        }
    }

    pub fn with_domain_object_name(mut self, domain_object_name: &str) -> Self {
        self.domain_object_name = domain_object_name.to_string();
        self
    }

    /// Name as used at runtime in generated SQL (`schema.table`).
    pub fn runtime_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for FullyQualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [self.catalog.as_deref(), self.schema.as_deref()]
            .into_iter()
            .flatten()
            .chain(std::iter::once(self.name.as_str()))
            .collect();
        f.write_str(&parts.join("."))
    }
}

/// Resolved column metadata used by the generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub property: String,
    pub java_type: JavaType,
    /// JDBC type constant name (e.g. `INTEGER`, `VARCHAR`).
    pub jdbc_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub blob: bool,
    /// Value computed by the database; never written by generated statements.
    pub generated_always: bool,
    /// Identity column as reported by the snapshot.
    pub identity: bool,
    pub type_handler: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: &str, java_type: JavaType, jdbc_type: &str) -> Self {
        Self {
            name: name.to_string(),
            property: property_name(name),
            java_type,
            jdbc_type: jdbc_type.to_string(),
            nullable: true,
            primary_key: false,
            blob: false,
            generated_always: false,
            identity: false,
            type_handler: None,
        }
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.property = property.to_string();
        self
    }

    pub fn with_type_handler(mut self, type_handler: &str) -> Self {
        self.type_handler = Some(type_handler.to_string());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn blob(mut self) -> Self {
        self.blob = true;
        self
    }

    pub fn generated_always(mut self) -> Self {
        self.generated_always = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// When a custom key statement runs relative to the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeyTiming {
    /// Sequence style: the key is fetched first and inserted with the row.
    Before,
    /// Identity style: the database assigns the key, fetched afterwards.
    After,
}

/// Policy for obtaining a database-assigned key after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedKey {
    JdbcStandard {
        column: String,
    },
    CustomSelect {
        column: String,
        statement: String,
        timing: KeyTiming,
    },
}

impl GeneratedKey {
    pub fn column(&self) -> &str {
        match self {
            GeneratedKey::JdbcStandard { column } | GeneratedKey::CustomSelect { column, .. } => {
                column
            }
        }
    }

    pub fn is_jdbc_standard(&self) -> bool {
        matches!(self, GeneratedKey::JdbcStandard { .. })
    }

    /// The database assigns the value; generated inserts leave the column out.
    pub fn is_identity(&self) -> bool {
        match self {
            GeneratedKey::JdbcStandard { .. } => true,
            GeneratedKey::CustomSelect { timing, .. } => *timing == KeyTiming::After,
        }
    }
}

/// Per-table statement switches from the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StatementToggles {
    pub insert: bool,
    /// `None` offers multi-row insert whenever the key strategy allows it;
    /// `Some(true)` asks for it explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_multiple: Option<bool>,
    pub select_by_primary_key: bool,
    pub select_by_example: bool,
    pub update_by_primary_key: bool,
    pub delete_by_primary_key: bool,
    pub delete_by_example: bool,
    pub count_by_example: bool,
    pub update_by_example: bool,
}

impl Default for StatementToggles {
    fn default() -> Self {
        Self {
            insert: true,
            insert_multiple: None,
            select_by_primary_key: true,
            select_by_example: true,
            update_by_primary_key: true,
            delete_by_primary_key: true,
            delete_by_example: true,
            count_by_example: true,
            update_by_example: true,
        }
    }
}

/// Everything the generators know about one table. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    table: FullyQualifiedTable,
    columns: Vec<ColumnDescriptor>,
    primary_key: Vec<String>,
    generated_key: Option<GeneratedKey>,
    statements: StatementToggles,
    model_only: bool,
    constructor_based: bool,
    root_interface: Option<JavaType>,
    model_package: String,
    client_package: String,
}

impl TableDescriptor {
    /// Build a descriptor; `primary_key` lists key columns in key order.
    pub fn new(
        table: FullyQualifiedTable,
        columns: Vec<ColumnDescriptor>,
        primary_key: Vec<String>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .map(|mut column| {
                column.primary_key = primary_key.contains(&column.name);
                column
            })
            .collect();

        Self {
            table,
            columns,
            primary_key,
            generated_key: None,
            statements: StatementToggles::default(),
            model_only: false,
            constructor_based: false,
            root_interface: None,
            model_package: String::new(),
            client_package: String::new(),
        }
    }

    pub fn with_generated_key(mut self, key: GeneratedKey) -> Self {
        self.generated_key = Some(key);
        self
    }

    pub fn with_statements(mut self, statements: StatementToggles) -> Self {
        self.statements = statements;
        self
    }

    pub fn with_model_only(mut self, model_only: bool) -> Self {
        self.model_only = model_only;
        self
    }

    pub fn with_constructor_based(mut self, constructor_based: bool) -> Self {
        self.constructor_based = constructor_based;
        self
    }

    pub fn with_root_interface(mut self, root_interface: JavaType) -> Self {
        self.root_interface = Some(root_interface);
        self
    }

    pub fn with_packages(mut self, model_package: &str, client_package: &str) -> Self {
        self.model_package = model_package.to_string();
        self.client_package = client_package.to_string();
        self
    }

    pub fn table(&self) -> &FullyQualifiedTable {
        &self.table
    }

    /// All columns in ordinal order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Primary key columns in key order; names that do not resolve are skipped.
    pub fn primary_key_columns(&self) -> Vec<&ColumnDescriptor> {
        self.primary_key
            .iter()
            .filter_map(|name| self.column(name))
            .collect()
    }

    /// Primary key names that reference no known column.
    pub fn missing_primary_key_columns(&self) -> Vec<&str> {
        self.primary_key
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(String::as_str)
            .collect()
    }

    pub fn non_primary_key_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.primary_key).collect()
    }

    /// Non-key columns that are not BLOBs.
    pub fn base_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !c.primary_key && !c.blob)
            .collect()
    }

    /// Non-key BLOB columns.
    pub fn blob_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !c.primary_key && c.blob)
            .collect()
    }

    pub fn has_primary_key_columns(&self) -> bool {
        !self.primary_key_columns().is_empty()
    }

    pub fn has_base_columns(&self) -> bool {
        !self.base_columns().is_empty()
    }

    pub fn has_blob_columns(&self) -> bool {
        !self.blob_columns().is_empty()
    }

    pub fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    /// Column backing the generated key, if the key names a known column.
    pub fn generated_key_column(&self) -> Option<&ColumnDescriptor> {
        self.generated_key
            .as_ref()
            .and_then(|key| self.column(key.column()))
    }

    /// Database-assigned column that inserts must leave out.
    pub fn is_identity(&self, column: &ColumnDescriptor) -> bool {
        column.identity
            || self
                .generated_key
                .as_ref()
                .is_some_and(|key| key.column() == column.name && key.is_identity())
    }

    /// Column populated from a sequence before the insert runs.
    pub fn is_sequence(&self, column: &ColumnDescriptor) -> bool {
        self.generated_key.as_ref().is_some_and(|key| {
            key.column() == column.name
                && matches!(
                    key,
                    GeneratedKey::CustomSelect {
                        timing: KeyTiming::Before,
                        ..
                    }
                )
        })
    }

    pub fn statements(&self) -> &StatementToggles {
        &self.statements
    }

    pub fn is_model_only(&self) -> bool {
        self.model_only
    }

    pub fn is_constructor_based(&self) -> bool {
        self.constructor_based
    }

    pub fn root_interface(&self) -> Option<&JavaType> {
        self.root_interface.as_ref()
    }

    pub fn record_type(&self) -> JavaType {
        qualified(&self.model_package, &self.table.domain_object_name)
    }

    pub fn mapper_type(&self) -> JavaType {
        qualified(
            &self.client_package,
            &format!("{}Mapper", self.table.domain_object_name),
        )
    }

    pub fn support_type(&self) -> JavaType {
        qualified(
            &self.client_package,
            &format!("{}DynamicSqlSupport", self.table.domain_object_name),
        )
    }

    /// Name of the table singleton inside the support class.
    pub fn table_field_name(&self) -> String {
        valid_property_name(&self.table.domain_object_name)
    }

    /// Result map id shared by the select-one and select-many methods.
    pub fn result_map_id(&self) -> String {
        format!("{}Result", self.table.domain_object_name)
    }
}

fn qualified(package: &str, name: &str) -> JavaType {
    if package.is_empty() {
        JavaType::new(name)
    } else {
        JavaType::new(&format!("{package}.{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_column(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, JavaType::new("java.lang.Integer"), "INTEGER")
    }

    #[test]
    fn primary_key_flags_follow_key_order() {
        let table = TableDescriptor::new(
            FullyQualifiedTable::new(None, Some("public"), "pkonly"),
            vec![int_column("seq_num"), int_column("id")],
            vec!["id".to_string(), "seq_num".to_string()],
        );

        let keys: Vec<&str> = table
            .primary_key_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(keys, vec!["id", "seq_num"]);
        assert!(table.columns().iter().all(|c| c.primary_key));
        assert!(!table.has_base_columns());
        assert!(!table.has_blob_columns());
    }

    #[test]
    fn key_timing_decides_identity_or_sequence() {
        let table = TableDescriptor::new(
            FullyQualifiedTable::new(None, None, "orders"),
            vec![int_column("id"), int_column("seq")],
            vec!["id".to_string()],
        )
        .with_generated_key(GeneratedKey::CustomSelect {
            column: "seq".to_string(),
            statement: "select nextval('orders_seq')".to_string(),
            timing: KeyTiming::Before,
        });

        let seq = table.column("seq").cloned().unwrap();
        let id = table.column("id").cloned().unwrap();
        assert!(table.is_sequence(&seq));
        assert!(!table.is_identity(&seq));
        assert!(!table.is_sequence(&id));
    }

    #[test]
    fn derives_generated_type_names() {
        let table = TableDescriptor::new(
            FullyQualifiedTable::new(None, Some("public"), "user_skills"),
            vec![int_column("id")],
            vec!["id".to_string()],
        )
        .with_packages("com.example.model", "com.example.mapper");

        assert_eq!(
            table.record_type().fully_qualified_name(),
            "com.example.model.UserSkills"
        );
        assert_eq!(
            table.support_type().fully_qualified_name(),
            "com.example.mapper.UserSkillsDynamicSqlSupport"
        );
        assert_eq!(table.table_field_name(), "userSkills");
        assert_eq!(table.table().to_string(), "public.user_skills");
    }
}
