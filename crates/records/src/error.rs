//! Records error types.

use serde::Serialize;
use thiserror::Error;

/// Validation failures for a record being created.
///
/// These are user mistakes, not system failures: they surface as 400s on
/// the HTTP API and as clarifying replies in chat.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordValidationError {
    /// record_type was neither "like" nor "note".
    #[error("record_type must be 'like' or 'note'")]
    InvalidType { value: String },

    /// A note needs non-empty content.
    #[error("content is required for record_type = 'note'")]
    MissingContent,

    /// wine_id must always be present.
    #[error("wine_id is required")]
    MissingWineId,

    /// wine_id does not name a card in the catalog.
    #[error("wine_id not found in the wine catalog")]
    UnknownWine { wine_id: String },
}

/// Errors that can occur during records operations.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The record was rejected before touching storage.
    #[error(transparent)]
    Validation(#[from] RecordValidationError),
}

/// Result type for records operations.
pub type Result<T> = std::result::Result<T, RecordsError>;
