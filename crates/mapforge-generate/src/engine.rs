use std::time::Instant;

use mapforge_core::TableDescriptor;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::dom::{CompilationUnit, render_unit};
use crate::errors::GenerationError;
use crate::fragments::Fragments;
use crate::generators::{
    ArtifactKind, FileKind, Generated, GenerationInput, GeneratorRegistry, mapper, record, support,
};
use crate::model::{
    Cancellation, GenerateOptions, GeneratedFile, GenerationIssue, GenerationReport, TableReport,
    codes,
};
use crate::plugins::{ExtensionPipeline, Interception, Subject};
use crate::rules::Rules;

/// Files and report of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedFile>,
    pub report: GenerationReport,
}

/// Everything produced for one table.
#[derive(Debug, Clone)]
pub struct TableOutput {
    pub files: Vec<GeneratedFile>,
    pub report: TableReport,
    pub issues: Vec<GenerationIssue>,
}

/// Entry point turning table descriptors into compilation units.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
    pipeline: ExtensionPipeline,
    registry: GeneratorRegistry,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions, pipeline: ExtensionPipeline) -> Self {
        Self {
            options,
            pipeline,
            registry: GeneratorRegistry::with_defaults(),
        }
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Generate every table. Tables run in parallel; the output keeps input
    /// order. Cancellation is honored before each table starts.
    pub fn run(
        &self,
        tables: &[TableDescriptor],
        cancel: &Cancellation,
    ) -> Result<GenerationOutput, GenerationError> {
        let start = Instant::now();
        info!(tables = tables.len(), "generation started");

        let outputs = tables
            .par_iter()
            .map(|table| {
                if cancel.is_cancelled() {
                    return Err(GenerationError::Cancelled);
                }
                Ok(self.generate_table(table))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = GenerationReport::default();
        let mut files = Vec::new();
        for output in outputs {
            for issue in output.issues {
                report.record_issue(issue);
            }
            report.tables.push(output.report);
            files.extend(output.files);
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            tables = report.tables.len(),
            files = files.len(),
            artifacts = report.artifacts_generated(),
            issues = report.issues.len(),
            errors = report.errors(),
            duration_ms = report.duration_ms,
            "generation completed"
        );
        Ok(GenerationOutput { files, report })
    }

    /// Assemble the record, support and mapper units of one table.
    pub fn generate_table(&self, table: &TableDescriptor) -> TableOutput {
        let rules = Rules::evaluate(table);
        let mut assembly = Assembly::default();

        for name in table.missing_primary_key_columns() {
            assembly.issues.push(
                GenerationIssue::warning(
                    codes::INTROSPECTION_GAP,
                    format!("primary key column '{name}' not found"),
                )
                .for_table(table),
            );
        }

        let file_kinds: &[FileKind] = if rules.java_client {
            &[FileKind::Record, FileKind::Support, FileKind::Mapper]
        } else {
            &[FileKind::Record]
        };

        let mut files = Vec::new();
        for &file in file_kinds {
            let skeleton = match file {
                FileKind::Record => record::skeleton(table),
                FileKind::Support => support::skeleton(table),
                FileKind::Mapper => mapper::skeleton(table),
            };
            if let Some(unit) = self.build_unit(table, &rules, file, skeleton, &mut assembly) {
                let target_dir = match file {
                    FileKind::Record => &self.options.model_dir,
                    FileKind::Support | FileKind::Mapper => &self.options.client_dir,
                };
                files.push(GeneratedFile {
                    target_dir: target_dir.clone(),
                    package: unit.package().to_string(),
                    file_name: unit.file_name(),
                    content: render_unit(&unit),
                    mergeable: true,
                    unit,
                });
            }
        }

        for issue in &assembly.issues {
            warn!(
                schema = table.table().schema.as_deref().unwrap_or(""),
                table = %table.table().name,
                artifact = issue.artifact.as_deref().unwrap_or(""),
                code = %issue.code,
                "{}",
                issue.message
            );
        }
        debug!(
            table = %table.table(),
            generated = assembly.generated,
            skipped = assembly.skipped,
            files = files.len(),
            "table generated"
        );

        let report = TableReport {
            schema: table.table().schema.clone(),
            table: table.table().name.clone(),
            artifacts_generated: assembly.generated,
            artifacts_skipped: assembly.skipped,
            files: files
                .iter()
                .map(|file| file.relative_path().display().to_string())
                .collect(),
        };
        TableOutput {
            files,
            report,
            issues: assembly.issues,
        }
    }

    fn build_unit(
        &self,
        table: &TableDescriptor,
        rules: &Rules,
        file: FileKind,
        mut unit: CompilationUnit,
        assembly: &mut Assembly,
    ) -> Option<CompilationUnit> {
        for generator in self.registry.for_file(file) {
            let generated = {
                let input = GenerationInput {
                    table,
                    rules,
                    fragments: Fragments::new(table),
                    unit: &unit,
                };
                (generator.generate)(&input)
            };

            let artifacts = match generated {
                Generated::NotApplicable => continue,
                Generated::Skipped(issue) => {
                    assembly.skipped += 1;
                    assembly.issues.push(issue);
                    continue;
                }
                Generated::Artifacts(artifacts) => artifacts,
            };

            for mut artifact in artifacts {
                let kind = artifact.kind;
                let outcome =
                    self.pipeline
                        .intercept(kind, Subject::Artifact(&mut artifact), table);
                if !outcome.accepted() {
                    assembly.skipped += 1;
                    assembly.issues.push(veto(table, kind, &outcome));
                    continue;
                }
                assembly.issues.append(&mut artifact.issues);
                for name in artifact.imports {
                    unit.add_import_name(name);
                }
                for name in artifact.static_imports {
                    unit.add_static_import(name);
                }
                unit.add_member(artifact.member);
                assembly.generated += 1;
            }
        }

        let kind = file.unit_kind();
        let outcome = self.pipeline.intercept(kind, Subject::Unit(&mut unit), table);
        if !outcome.accepted() {
            assembly.issues.push(veto(table, kind, &outcome));
            return None;
        }
        Some(unit)
    }
}

#[derive(Debug, Default)]
struct Assembly {
    generated: usize,
    skipped: usize,
    issues: Vec<GenerationIssue>,
}

fn veto(table: &TableDescriptor, kind: ArtifactKind, outcome: &Interception) -> GenerationIssue {
    GenerationIssue::warning(
        codes::PLUGIN_VETO,
        format!("rejected by {}", outcome.rejected_by.join(", ")),
    )
    .for_table(table)
    .for_artifact(kind)
}
