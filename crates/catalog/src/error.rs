//! Catalog error types.

use thiserror::Error;

/// Errors surfaced by catalog queries.
///
/// Engine diagnostics stay inside the `EngineFailure` message; callers log
/// them and show users a generic failure line instead.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The statement ran past its deadline and was aborted.
    #[error("query timed out")]
    Timeout,

    /// Any engine-level syntax or runtime failure.
    #[error("engine failure: {0}")]
    EngineFailure(String),
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &err {
            if inner.code == rusqlite::ErrorCode::OperationInterrupted {
                return ExecutionError::Timeout;
            }
        }
        ExecutionError::EngineFailure(err.to_string())
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, ExecutionError>;
