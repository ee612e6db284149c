use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Codes of the issues raised while validating and resolving a configuration.
pub mod codes {
    pub const SCHEMA_VIOLATION: &str = "schema_violation";
    pub const SCHEMA_VALIDATION_ERROR: &str = "schema_validation_error";
    pub const INVALID_CONFIG_JSON: &str = "invalid_config_json";
    pub const CONFIG_VERSION_MISMATCH: &str = "config_version_mismatch";

    pub const INVALID_PACKAGE: &str = "invalid_package";
    /// A target directory key is empty, absolute or leaves the output root.
    pub const INVALID_DIRECTORY_KEY: &str = "invalid_directory_key";

    pub const EMPTY_PLUGIN_ID: &str = "empty_plugin_id";
    pub const DUPLICATE_PLUGIN: &str = "duplicate_plugin";

    pub const TABLES_EMPTY: &str = "tables_empty";
    pub const DUPLICATE_TABLE_RULE: &str = "duplicate_table_rule";
    pub const UNKNOWN_SCHEMA: &str = "unknown_schema";
    pub const UNKNOWN_TABLE: &str = "unknown_table";
    pub const INVALID_DOMAIN_OBJECT_NAME: &str = "invalid_domain_object_name";
    pub const INVALID_ROOT_INTERFACE: &str = "invalid_root_interface";

    pub const UNKNOWN_KEY_COLUMN: &str = "unknown_key_column";
    pub const IGNORED_KEY_COLUMN: &str = "ignored_key_column";
    pub const IGNORED_KEY_STATEMENT: &str = "ignored_key_statement";
    pub const MISSING_KEY_STATEMENT: &str = "missing_key_statement";
    /// A single-word key statement that names no known dialect.
    pub const UNKNOWN_KEY_DIALECT: &str = "unknown_key_dialect";

    pub const UNKNOWN_COLUMN: &str = "unknown_column";
    pub const DUPLICATE_COLUMN_OVERRIDE: &str = "duplicate_column_override";
    pub const INVALID_PROPERTY_NAME: &str = "invalid_property_name";
    pub const OVERRIDE_ON_IGNORED_COLUMN: &str = "override_on_ignored_column";
    pub const UNKNOWN_IGNORED_COLUMN: &str = "unknown_ignored_column";
    pub const IGNORED_PRIMARY_KEY_COLUMN: &str = "ignored_primary_key_column";

    /// A snapshot column type with no Java mapping.
    pub const INTROSPECTION_GAP: &str = "introspection_gap";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A configuration problem located by a JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(code, path, message)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Issues of one validation pass, split by severity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Failures that prevent a configuration from being read at all.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("configuration schema does not compile: {0}")]
    Schema(String),
    #[error("unsupported config format '{0}' (expected toml or json)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_are_routed_by_severity() {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::warning(codes::DUPLICATE_PLUGIN, "/plugins/1/id", "twice"));
        assert!(report.is_ok());
        report.push(
            ValidationIssue::error(codes::UNKNOWN_KEY_DIALECT, "/tables/0/generated_key/statement", "'Postgress' is not a dialect")
                .with_hint("use MySql"),
        );
        assert!(!report.is_ok());
        assert_eq!(
            report.errors[0].to_string(),
            "[unknown_key_dialect] /tables/0/generated_key/statement: 'Postgress' is not a dialect (hint: use MySql)"
        );
    }
}
