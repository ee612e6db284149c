use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::{ConfigError, Result};
use crate::model::GeneratorConfig;

/// Read a configuration file into a JSON value, dispatching on the extension.
///
/// TOML documents are decoded straight into `serde_json::Value` so both
/// formats go through the same JSON Schema validation.
pub fn load_config_value(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    debug!(path = %path.display(), format = %extension, "loading generator config");

    match extension.as_str() {
        "toml" => parse_toml(&raw),
        "json" => Ok(serde_json::from_str(&raw)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Read and deserialize a configuration file without cross-validation.
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let value = load_config_value(path)?;
    Ok(serde_json::from_value(value)?)
}

pub fn parse_toml(raw: &str) -> Result<Value> {
    Ok(toml::from_str::<Value>(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_tables_become_json_objects() {
        let value = parse_toml(
            r#"
config_version = "0.1"

[targets]
model_package = "com.example.model"
client_package = "com.example.mapper"

[[tables]]
schema = "public"
table = "orders"
"#,
        )
        .expect("parse toml");

        assert_eq!(value["targets"]["model_package"], "com.example.model");
        assert_eq!(value["tables"][0]["table"], "orders");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mapforge.yaml");
        fs::write(&path, "a: 1").expect("write");

        let err = load_config_value(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }
}
