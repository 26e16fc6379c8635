//! Error types for the assistant.

use thiserror::Error;

/// Errors from a [`crate::Brain`] implementation.
#[derive(Debug, Error)]
pub enum BrainError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The model endpoint answered, but unusably.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Failures the assistant cannot turn into a conversational reply.
///
/// Gate rejections and query timeouts are handled inside the flow; what is
/// left here is infrastructure: the model, the records database, or the
/// catalog file itself.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Brain(#[from] BrainError),

    #[error(transparent)]
    Records(#[from] records::RecordsError),

    #[error(transparent)]
    Catalog(#[from] catalog::ExecutionError),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
