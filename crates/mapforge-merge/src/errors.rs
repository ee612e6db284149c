use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot parse existing file: {0}")]
    Unparseable(String),
    #[error("existing file is incompatible: {0}")]
    Conflict(String),
    #[error("directory '{dir}' unavailable: {reason}")]
    Directory { dir: String, reason: String },
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
