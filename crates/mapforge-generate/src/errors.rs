use thiserror::Error;

/// Errors that abort a generation run.
///
/// Per-artifact problems are not errors: they are reported as
/// [`crate::model::GenerationIssue`] values and generation continues.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation cancelled")]
    Cancelled,
}
