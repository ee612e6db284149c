use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Formatted and raw database type metadata for a column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    /// User-friendly formatted type (e.g. `character varying(255)`).
    pub data_type: String,
    /// Name of the underlying type (e.g. `int4`).
    pub udt_name: String,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

impl ColumnType {
    /// Data type without any length/precision suffix, lowercased.
    pub fn base_name(&self) -> String {
        self.data_type
            .split('(')
            .next()
            .unwrap_or(&self.data_type)
            .trim()
            .to_lowercase()
    }
}

/// Identity generation strategy for columns using `GENERATED ... AS IDENTITY`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

/// Kind of computed column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedKind {
    Stored,
}

/// Information about computed column expressions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedExpression {
    pub kind: GeneratedKind,
    pub expression: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_modifiers() {
        let column_type = ColumnType {
            data_type: "Character Varying(255)".to_string(),
            udt_name: "varchar".to_string(),
            character_max_length: Some(255),
            numeric_precision: None,
            numeric_scale: None,
        };
        assert_eq!(column_type.base_name(), "character varying");
    }
}
