use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mapforge_core::TableDescriptor;
use serde::{Deserialize, Serialize};

use crate::dom::CompilationUnit;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Target directory key for record classes.
    pub model_dir: String,
    /// Target directory key for mapper interfaces and support classes.
    pub client_dir: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model_dir: "src/main/java".to_string(),
            client_dir: "src/main/java".to_string(),
        }
    }
}

/// Shared flag checked between tables and between files.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Warning,
    Error,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Warning => f.write_str("warning"),
            IssueLevel::Error => f.write_str("error"),
        }
    }
}

/// Codes for the recoverable problems of a run.
pub mod codes {
    /// Artifact requested but incompatible with the key strategy.
    pub const CONFIGURATION_ERROR: &str = "configuration_error";
    /// A referenced key or column is missing from the table.
    pub const INTROSPECTION_GAP: &str = "introspection_gap";
    /// An interceptor rejected an artifact or unit.
    pub const PLUGIN_VETO: &str = "plugin_veto";
    pub const MERGE_CONFLICT: &str = "merge_conflict";
    pub const DIRECTORY_RESOLUTION_ERROR: &str = "directory_resolution_error";
    pub const OVERWRITTEN: &str = "overwritten";
    pub const DISAMBIGUATED: &str = "disambiguated";
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: IssueLevel,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code: code.to_string(),
            message: message.into(),
            schema: None,
            table: None,
            artifact: None,
        }
    }

    /// An explicitly requested artifact or file could not be produced.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            ..Self::warning(code, message)
        }
    }

    pub fn for_table(mut self, table: &TableDescriptor) -> Self {
        self.schema = table.table().schema.clone();
        self.table = Some(table.table().name.clone());
        self
    }

    pub fn for_artifact(mut self, artifact: impl fmt::Display) -> Self {
        self.artifact = Some(artifact.to_string());
        self
    }
}

impl fmt::Display for GenerationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(table) = &self.table {
            match &self.schema {
                Some(schema) => write!(f, " (table {schema}.{table}")?,
                None => write!(f, " (table {table}")?,
            }
            if let Some(artifact) = &self.artifact {
                write!(f, ", {artifact}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// A serialized unit handed to the file writer.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Directory key relative to the output root.
    pub target_dir: String,
    pub package: String,
    pub file_name: String,
    pub content: String,
    /// An existing file at the same path may be merged rather than replaced.
    pub mergeable: bool,
    pub unit: CompilationUnit,
}

impl GeneratedFile {
    /// Path below the output root: directory key, package directories, file.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.target_dir);
        for segment in self.package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(&self.file_name);
        path
    }
}

/// Summary of one generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub schema: Option<String>,
    pub table: String,
    pub artifacts_generated: usize,
    pub artifacts_skipped: usize,
    pub files: Vec<String>,
}

/// Report for a generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub tables: Vec<TableReport>,
    pub issues_by_code: BTreeMap<String, u64>,
    pub issues: Vec<GenerationIssue>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn record_issue(&mut self, issue: GenerationIssue) {
        *self.issues_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.issues.push(issue);
    }

    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count()
    }

    pub fn artifacts_generated(&self) -> usize {
        self.tables.iter().map(|table| table.artifacts_generated).sum()
    }

    pub fn files_generated(&self) -> usize {
        self.tables.iter().map(|table| table.files.len()).sum()
    }
}
