//! Structured run logs: one JSON object per line in the run's `logs.ndjson`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use mapforge_config::{IssueSeverity, ValidationReport};
use mapforge_generate::{GenerationIssue, IssueLevel};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

pub const LOG_ENV: &str = "MAPFORGE_LOG";
const DEFAULT_FILTER: &str = "info";

/// Filter directives for a run: the command-line flag wins over
/// `MAPFORGE_LOG`, which wins over `info`.
pub fn log_filter(flag: Option<&str>, env: Option<&str>) -> String {
    [flag, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directives| !directives.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Route every event of the run to `path`. Events carry the fields of the
/// span they were emitted in, so the `run` span tags each line with its run id.
pub fn init_run_logging(path: &Path, flag: Option<&str>) -> RegistryResult<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = log_filter(flag, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .map_err(|err| RegistryError::Logging(format!("invalid log filter '{directives}': {err}")))?;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let file = Arc::new(Mutex::new(file));
    let make_writer = BoxMakeWriter::new(move || SharedWriter {
        file: Arc::clone(&file),
    });

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(make_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))?;

    Ok(())
}

/// One event per configuration issue, keyed by its code and JSON pointer.
pub fn log_config_issues(report: &ValidationReport) {
    for issue in report.errors.iter().chain(&report.warnings) {
        let hint = issue.hint.as_deref().unwrap_or("");
        match issue.severity {
            IssueSeverity::Error => {
                error!(event = "config_issue", code = %issue.code, path = %issue.path, hint, "{}", issue.message)
            }
            IssueSeverity::Warning => {
                warn!(event = "config_issue", code = %issue.code, path = %issue.path, hint, "{}", issue.message)
            }
        }
    }
}

/// One event per generation or write issue; `stage` names the step that
/// raised it.
pub fn log_issues(stage: &'static str, issues: &[GenerationIssue]) {
    for issue in issues {
        let table = issue.table.as_deref().unwrap_or("");
        let artifact = issue.artifact.as_deref().unwrap_or("");
        match issue.level {
            IssueLevel::Error => {
                error!(event = stage, code = %issue.code, table, artifact, "{}", issue.message)
            }
            IssueLevel::Warning => {
                warn!(event = stage, code = %issue.code, table, artifact, "{}", issue.message)
            }
        }
    }
}

struct SharedWriter {
    file: Arc<Mutex<File>>,
}

impl SharedWriter {
    fn lock(&self) -> io::Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment_beats_default() {
        assert_eq!(log_filter(Some("debug"), Some("warn")), "debug");
        assert_eq!(log_filter(None, Some("mapforge_merge=trace")), "mapforge_merge=trace");
        assert_eq!(log_filter(Some("  "), None), "info");
        assert_eq!(log_filter(None, None), "info");
    }
}
