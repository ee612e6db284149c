use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Named column list shared by primary keys and unique constraints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KeyColumns {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// `CHECK` constraint as recorded in the snapshot; the expression is not interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckConstraint {
    pub name: Option<String>,
    pub expression: String,
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Table-level constraint definitions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    PrimaryKey(KeyColumns),
    ForeignKey(ForeignKey),
    Unique(KeyColumns),
    Check(CheckConstraint),
}
