//! Generator configuration contracts, validation and table resolution.

pub mod dialect;
pub mod errors;
pub mod load;
pub mod model;
pub mod resolve;
pub mod schema;
pub mod type_resolver;
pub mod validate;

pub use dialect::KeyDialect;
pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport, codes};
pub use load::{load_config, load_config_value, parse_toml};
pub use model::{
    CONFIG_VERSION, ColumnOverride, GeneratedKeyRule, GeneratorConfig, GeneratorOptions,
    KeyStrategy, PluginRef, TableRule, Targets,
};
pub use resolve::{resolve_generated_key, resolve_tables};
pub use schema::config_json_schema;
pub use type_resolver::{ResolvedType, resolve_column_type};
pub use validate::{
    ValidatedConfig, validate_config, validate_config_against_schema, validate_config_json,
};
