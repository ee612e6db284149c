use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Constraint, KeyColumns};
use crate::types::{ColumnType, GeneratedExpression, IdentityGeneration};

/// Top-level schema snapshot handed over by the introspection collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    /// Contract version for this schema format.
    pub schema_version: String,
    /// Database engine identifier (e.g. `postgres`).
    pub engine: String,
    /// Database (catalog) name when available.
    pub database: Option<String>,
    /// Schemas captured from the database.
    pub schemas: Vec<Schema>,
}

impl DatabaseSchema {
    /// Look up a table by schema and table name.
    pub fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.schemas
            .iter()
            .find(|candidate| candidate.name == schema)
            .and_then(|candidate| candidate.tables.iter().find(|t| t.name == table))
    }
}

/// A namespace containing tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

/// A table-like object captured by introspection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
}

impl Table {
    /// Primary key column names in key order, empty when the table has none.
    pub fn primary_key(&self) -> &[String] {
        self.constraints
            .iter()
            .find_map(|constraint| match constraint {
                Constraint::PrimaryKey(KeyColumns { columns, .. }) => Some(columns.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Kind of table represented in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    PartitionedTable,
    View,
    MaterializedView,
    ForeignTable,
    Other(String),
}

/// Column metadata for a table-like object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub ordinal_position: i16,
    pub name: String,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub identity: Option<IdentityGeneration>,
    pub generated: Option<GeneratedExpression>,
    pub comment: Option<String>,
}
