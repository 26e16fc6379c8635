//! Records models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::RecordValidationError;

/// The closed set of record kinds a user can attach to a wine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RecordType {
    /// A like; content defaults to a sentinel when absent.
    Like,
    /// A note; content is mandatory.
    Note,
}

impl RecordType {
    /// Parse a loosely-typed input value at the boundary.
    pub fn parse(value: &str) -> Result<Self, RecordValidationError> {
        match value.trim().to_lowercase().as_str() {
            "like" => Ok(RecordType::Like),
            "note" => Ok(RecordType::Note),
            other => Err(RecordValidationError::InvalidType {
                value: other.to_string(),
            }),
        }
    }

    /// Storage/API representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Like => "like",
            RecordType::Note => "note",
        }
    }
}

/// A persisted public record. Immutable history: rows are only ever
/// inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Record {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Resolved display user; nullable in storage.
    pub user: Option<String>,
    /// Record kind.
    pub record_type: RecordType,
    /// Note text, or the like sentinel.
    pub content: Option<String>,
    /// Catalog identifier (card key or URL) the record points at.
    pub wine_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp; equal to created_at, rows are never updated.
    pub updated_at: String,
}

/// Per-wine aggregate, always computed from current rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WineSummary {
    pub wine_id: String,
    pub like_count: i64,
    pub note_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_type() {
        assert_eq!(RecordType::parse("like"), Ok(RecordType::Like));
        assert_eq!(RecordType::parse(" NOTE "), Ok(RecordType::Note));
        assert!(matches!(
            RecordType::parse("bookmark"),
            Err(RecordValidationError::InvalidType { .. })
        ));
        assert!(matches!(
            RecordType::parse(""),
            Err(RecordValidationError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_record_type_serde_shape() {
        assert_eq!(serde_json::to_string(&RecordType::Like).unwrap(), "\"like\"");
    }
}
