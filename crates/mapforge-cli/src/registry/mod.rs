mod logging;
mod run;

pub use logging::{init_run_logging, log_config_issues, log_issues};
pub use run::{RunContext, RunOptions, RunPaths, start_run, write_reports};

use thiserror::Error;

/// Registry-level errors for run artifacts.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("publish error: {0}")]
    Publish(#[from] mapforge_merge::MergeError),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
