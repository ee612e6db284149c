use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, Utc};
use mapforge_generate::GenerationReport;
use mapforge_merge::{WriteReport, write_json_atomic};
use serde::Serialize;

use super::RegistryResult;

/// Serializable options for runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub schema_path: PathBuf,
    pub config_path: PathBuf,
    pub out_root: PathBuf,
    pub overwrite: bool,
    pub merge: bool,
    pub plugins: Vec<String>,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub schema_version: String,
    pub config_version: String,
    pub runs_dir: PathBuf,
    pub options: RunOptions,
}

/// JSON record written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub schema_version: String,
    pub config_version: String,
    pub options: RunOptions,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub generation_report_path: PathBuf,
    pub write_report_path: PathBuf,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.runs_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        schema_version: ctx.schema_version.clone(),
        config_version: ctx.config_version.clone(),
        options: ctx.options.clone(),
        git: collect_git_info(),
    };
    write_json_atomic(&root.join("run.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        generation_report_path: root.join("generation_report.json"),
        write_report_path: root.join("write_report.json"),
        logs_path,
        root,
    })
}

pub fn write_reports(
    paths: &RunPaths,
    generation: &GenerationReport,
    write: &WriteReport,
) -> RegistryResult<()> {
    write_json_atomic(&paths.generation_report_path, generation)?;
    write_json_atomic(&paths.write_report_path, write)?;
    Ok(())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}
