use thiserror::Error;

/// Errors raised while checking a schema snapshot.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema snapshot violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// Convenience alias for results returned by mapforge crates.
pub type Result<T> = std::result::Result<T, Error>;
