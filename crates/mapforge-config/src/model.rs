use std::collections::BTreeMap;

use mapforge_core::{KeyTiming, StatementToggles};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current contract version for generator configuration files.
pub const CONFIG_VERSION: &str = "0.1";

/// Canonical generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratorConfig {
    /// Contract version for the configuration format.
    pub config_version: String,
    /// Where generated records and mappers go.
    pub targets: Targets,
    /// Run-wide switches.
    #[serde(default)]
    pub options: GeneratorOptions,
    /// Interceptors, invoked in the order listed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginRef>,
    /// Per-table rule sets.
    pub tables: Vec<TableRule>,
}

/// Target packages and directory keys for generated files.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Targets {
    /// Package of generated record classes.
    pub model_package: String,
    /// Package of generated mapper interfaces and support classes.
    pub client_package: String,
    /// Directory key (relative to the output root) for record classes.
    #[serde(default = "default_source_dir")]
    pub model_dir: String,
    /// Directory key (relative to the output root) for mapper files.
    #[serde(default = "default_source_dir")]
    pub client_dir: String,
}

fn default_source_dir() -> String {
    "src/main/java".to_string()
}

/// Options applied to every table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Overwrite existing files that cannot be merged.
    pub overwrite: bool,
    /// Merge regenerated files into existing ones.
    pub merge: bool,
    /// Map temporal columns to `java.time` types instead of `java.util.Date`.
    pub use_jsr310_types: bool,
    /// Map every exact numeric column to `java.math.BigDecimal`.
    pub force_big_decimals: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            merge: true,
            use_jsr310_types: true,
            force_big_decimals: false,
        }
    }
}

/// Reference to a registered interceptor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PluginRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Rule set for a single table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableRule {
    pub schema: String,
    pub table: String,
    /// Overrides the UpperCamelCase table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_object_name: Option<String>,
    /// Generate the record class only.
    #[serde(default)]
    pub model_only: bool,
    /// Map query results through the record constructor.
    #[serde(default)]
    pub constructor_based: bool,
    /// Fully qualified interface the mapper extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_interface: Option<String>,
    #[serde(default)]
    pub statements: StatementToggles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_key: Option<GeneratedKeyRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_columns: Vec<String>,
}

/// How the key is retrieved after (or before) an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// `useGeneratedKeys` via the JDBC driver.
    Jdbc,
    /// A SELECT statement run by the mapper.
    Custom,
}

/// Generated key rule for a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedKeyRule {
    pub column: String,
    pub strategy: KeyStrategy,
    /// Statement text or a known dialect name (`MySql`, `HSQLDB`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<KeyTiming>,
}

/// Per-column adjustments applied on top of introspected metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnOverride {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Fully qualified Java type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_type: Option<String>,
    /// JDBC type constant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdbc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_always: Option<bool>,
}
