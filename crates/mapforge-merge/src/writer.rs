//! Per-file publishing state machine.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mapforge_generate::{Cancellation, GeneratedFile, GenerationIssue, IssueLevel, codes};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::atomic::write_bytes_atomic;
use crate::errors::{MergeError, Result};
use crate::merge::JavaMerger;

/// Highest numeric suffix tried when disambiguating a file name.
const MAX_SUFFIX: u32 = 1000;

/// Maps a directory key plus package to a writable directory.
pub trait DirectoryResolver: Send + Sync {
    fn resolve(&self, target_dir: &str, package: &str) -> Result<PathBuf>;
}

/// Resolves directory keys below a single output root, creating package
/// directories on demand.
#[derive(Debug, Clone)]
pub struct RootResolver {
    root: PathBuf,
}

impl RootResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DirectoryResolver for RootResolver {
    fn resolve(&self, target_dir: &str, package: &str) -> Result<PathBuf> {
        let key = Path::new(target_dir);
        if key
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(MergeError::Directory {
                dir: target_dir.to_string(),
                reason: "directory key must stay below the output root".to_string(),
            });
        }

        let mut dir = self.root.join(key);
        for segment in package.split('.').filter(|segment| !segment.is_empty()) {
            dir.push(segment);
        }
        fs::create_dir_all(&dir).map_err(|err| MergeError::Directory {
            dir: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(dir)
    }
}

/// Merge capability for one file type.
pub trait FileMerger: Send + Sync {
    fn id(&self) -> &'static str;

    /// Content to publish in place of `existing`.
    fn merge(&self, existing: &str, file: &GeneratedFile) -> Result<String>;
}

/// Merge capabilities keyed by file extension.
#[derive(Clone, Default)]
pub struct MergeRegistry {
    by_extension: BTreeMap<String, Arc<dyn FileMerger>>,
}

impl fmt::Debug for MergeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mergers: BTreeMap<&str, &'static str> = self
            .by_extension
            .iter()
            .map(|(extension, merger)| (extension.as_str(), merger.id()))
            .collect();
        f.debug_struct("MergeRegistry")
            .field("mergers", &mergers)
            .finish()
    }
}

impl MergeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("java", Arc::new(JavaMerger));
        registry
    }

    pub fn register(&mut self, extension: &str, merger: Arc<dyn FileMerger>) {
        self.by_extension.insert(extension.to_string(), merger);
    }

    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn FileMerger>> {
        let extension = path.extension()?.to_str()?;
        self.by_extension.get(extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteOptions {
    /// Replace files that cannot be merged instead of writing a numbered copy.
    pub overwrite: bool,
    /// Merge into existing files when a capability is registered.
    pub merge: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            merge: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    NoExistingFile,
    ExistingMergeable,
    ExistingNonMergeable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    Created,
    Merged,
    /// Merge produced the existing bytes; nothing was written.
    Unchanged,
    Overwritten,
    Disambiguated,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    /// Path below the output root the unit was meant for.
    pub target: PathBuf,
    /// Where the content landed, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,
    pub action: WriteAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    pub files: Vec<WrittenFile>,
    pub issues_by_code: BTreeMap<String, u64>,
    pub issues: Vec<GenerationIssue>,
    /// The run stopped early; `files` lists what was handled before that.
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl WriteReport {
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

    pub fn count(&self, action: WriteAction) -> usize {
        self.files.iter().filter(|file| file.action == action).count()
    }
}

struct FileOutcome {
    file: WrittenFile,
    issue: Option<GenerationIssue>,
}

impl FileOutcome {
    fn skipped(target: PathBuf, state: Option<FileState>, issue: GenerationIssue) -> Self {
        Self {
            file: WrittenFile {
                target,
                written_to: None,
                state,
                action: WriteAction::Skipped,
            },
            issue: Some(issue),
        }
    }
}

/// Publishes generated files below an output root.
#[derive(Debug)]
pub struct FileWriter<R> {
    resolver: R,
    options: WriteOptions,
    mergers: MergeRegistry,
}

impl<R: DirectoryResolver> FileWriter<R> {
    pub fn new(resolver: R, options: WriteOptions) -> Self {
        Self {
            resolver,
            options,
            mergers: MergeRegistry::with_defaults(),
        }
    }

    pub fn with_mergers(mut self, mergers: MergeRegistry) -> Self {
        self.mergers = mergers;
        self
    }

    /// Publish every file. Files sharing a target path are handled in order
    /// by one worker; distinct paths are written in parallel. Cancellation is
    /// checked before each file; files already published stay in the report.
    pub fn write_all(&self, files: &[GeneratedFile], cancel: &Cancellation) -> WriteReport {
        let start = Instant::now();
        info!(files = files.len(), overwrite = self.options.overwrite, merge = self.options.merge, "write started");

        let mut groups: Vec<Vec<&GeneratedFile>> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();
        for file in files {
            let slot = *by_path.entry(file.relative_path()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(file);
        }

        let outcomes = groups
            .par_iter()
            .map(|group| {
                let mut written = Vec::with_capacity(group.len());
                for file in group {
                    if cancel.is_cancelled() {
                        return (written, true);
                    }
                    written.push(self.write_one(file));
                }
                (written, false)
            })
            .collect::<Vec<_>>();

        let mut report = WriteReport::default();
        for (group, cancelled) in outcomes {
            report.cancelled |= cancelled;
            for outcome in group {
                if let Some(issue) = outcome.issue {
                    report.record_issue(issue);
                }
                report.files.push(outcome.file);
            }
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            created = report.count(WriteAction::Created),
            merged = report.count(WriteAction::Merged),
            unchanged = report.count(WriteAction::Unchanged),
            skipped = report.count(WriteAction::Skipped),
            issues = report.issues.len(),
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "write completed"
        );
        report
    }

    fn write_one(&self, file: &GeneratedFile) -> FileOutcome {
        let target = file.relative_path();
        let dir = match self.resolver.resolve(&file.target_dir, &file.package) {
            Ok(dir) => dir,
            Err(err) => {
                return FileOutcome::skipped(
                    target.clone(),
                    None,
                    issue(codes::DIRECTORY_RESOLUTION_ERROR, &target, err.to_string()),
                );
            }
        };

        let path = dir.join(&file.file_name);
        let merger = self.mergers.for_path(&path);
        let state = if !path.exists() {
            FileState::NoExistingFile
        } else if self.options.merge && file.mergeable && merger.is_some() {
            FileState::ExistingMergeable
        } else {
            FileState::ExistingNonMergeable
        };
        debug!(path = %path.display(), state = ?state, "publishing file");

        let outcome = match (state, merger) {
            (FileState::ExistingMergeable, Some(merger)) => {
                self.merge_into(&target, &path, file, merger.as_ref())
            }
            (FileState::ExistingNonMergeable, _) if !self.options.overwrite => {
                match disambiguated_path(&dir, &file.file_name) {
                    Some(copy) => publish(&target, &copy, file, WriteAction::Disambiguated).map(
                        |mut outcome| {
                            outcome.issue = Some(issue(
                                codes::DISAMBIGUATED,
                                &target,
                                format!("existing file kept; wrote {}", copy.display()),
                            ));
                            outcome
                        },
                    ),
                    None => Err(issue(
                        codes::DIRECTORY_RESOLUTION_ERROR,
                        &target,
                        format!("no free file name below suffix {MAX_SUFFIX}"),
                    )),
                }
            }
            (FileState::ExistingNonMergeable, _) => {
                publish(&target, &path, file, WriteAction::Overwritten).map(|mut outcome| {
                    outcome.issue = Some(issue(
                        codes::OVERWRITTEN,
                        &target,
                        "existing file overwritten",
                    ));
                    outcome
                })
            }
            _ => publish(&target, &path, file, WriteAction::Created),
        };

        let mut outcome = outcome.unwrap_or_else(|issue| {
            FileOutcome::skipped(target.clone(), Some(state), issue)
        });
        outcome.file.state = Some(state);
        if let Some(issue) = &outcome.issue {
            warn!(path = %target.display(), code = %issue.code, "{}", issue.message);
        }
        outcome
    }

    fn merge_into(
        &self,
        target: &Path,
        path: &Path,
        file: &GeneratedFile,
        merger: &dyn FileMerger,
    ) -> std::result::Result<FileOutcome, GenerationIssue> {
        let conflict = |err: MergeError| issue(codes::MERGE_CONFLICT, target, err.to_string());
        let existing = fs::read_to_string(path).map_err(|err| conflict(err.into()))?;
        let content = merger.merge(&existing, file).map_err(conflict)?;

        if content == existing {
            return Ok(FileOutcome {
                file: WrittenFile {
                    target: target.to_path_buf(),
                    written_to: Some(path.to_path_buf()),
                    state: None,
                    action: WriteAction::Unchanged,
                },
                issue: None,
            });
        }
        write_bytes_atomic(path, content.as_bytes())
            .map_err(|err| issue(codes::DIRECTORY_RESOLUTION_ERROR, target, err.to_string()))?;
        Ok(FileOutcome {
            file: WrittenFile {
                target: target.to_path_buf(),
                written_to: Some(path.to_path_buf()),
                state: None,
                action: WriteAction::Merged,
            },
            issue: None,
        })
    }
}

fn publish(
    target: &Path,
    path: &Path,
    file: &GeneratedFile,
    action: WriteAction,
) -> std::result::Result<FileOutcome, GenerationIssue> {
    write_bytes_atomic(path, file.content.as_bytes())
        .map_err(|err| issue(codes::DIRECTORY_RESOLUTION_ERROR, target, err.to_string()))?;
    Ok(FileOutcome {
        file: WrittenFile {
            target: target.to_path_buf(),
            written_to: Some(path.to_path_buf()),
            state: None,
            action,
        },
        issue: None,
    })
}

/// First `name.N` in `dir` that does not exist yet.
fn disambiguated_path(dir: &Path, file_name: &str) -> Option<PathBuf> {
    (1..MAX_SUFFIX)
        .map(|suffix| dir.join(format!("{file_name}.{suffix}")))
        .find(|candidate| !candidate.exists())
}

/// Skipped files are errors; files written under another name or over an
/// existing one are warnings.
fn issue(code: &str, target: &Path, message: impl Into<String>) -> GenerationIssue {
    let message = format!("{}: {}", target.display(), message.into());
    match code {
        codes::MERGE_CONFLICT | codes::DIRECTORY_RESOLUTION_ERROR => {
            GenerationIssue::error(code, message)
        }
        _ => GenerationIssue::warning(code, message),
    }
}
