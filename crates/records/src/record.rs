//! Public record persistence: create, list, summarize.
//!
//! The table is append-only by construction: this module exposes no update
//! or delete path, and every user action inserts a fresh row.

use sqlx::SqlitePool;

use crate::error::{RecordValidationError, Result};
use crate::models::{Record, RecordType, WineSummary};

/// Content stored for a like created without explicit content.
pub const LIKE_DEFAULT_CONTENT: &str = "1";

/// Input for a record about to be created. The user field must already be
/// resolved (see [`crate::user::effective_user`]).
#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    pub user: &'a str,
    pub record_type: &'a str,
    pub content: Option<&'a str>,
    pub wine_id: &'a str,
}

/// Optional filters for listing records; all combinable.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub wine_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub user: Option<String>,
}

/// Validate and insert one record, returning the stored row.
pub async fn create_record(pool: &SqlitePool, new: NewRecord<'_>) -> Result<Record> {
    let record_type = RecordType::parse(new.record_type)?;

    let wine_id = new.wine_id.trim();
    if wine_id.is_empty() {
        return Err(RecordValidationError::MissingWineId.into());
    }

    let content = new.content.map(str::trim).filter(|c| !c.is_empty());
    let content = match record_type {
        RecordType::Note => content
            .ok_or(RecordValidationError::MissingContent)?
            .to_string(),
        RecordType::Like => content.unwrap_or(LIKE_DEFAULT_CONTENT).to_string(),
    };

    let user = new.user.trim();
    let user = if user.is_empty() { None } else { Some(user) };

    let insert = sqlx::query(
        r#"
        INSERT INTO public_records (user, record_type, content, wine_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user)
    .bind(record_type.as_str())
    .bind(&content)
    .bind(wine_id)
    .execute(pool)
    .await?;

    let record = sqlx::query_as::<_, Record>(
        r#"
        SELECT id, user, record_type, content, wine_id, created_at, updated_at
        FROM public_records
        WHERE id = ?
        "#,
    )
    .bind(insert.last_insert_rowid())
    .fetch_one(pool)
    .await?;

    tracing::info!(
        id = record.id,
        record_type = record.record_type.as_str(),
        wine_id = %record.wine_id,
        "public record created"
    );
    Ok(record)
}

/// List records, newest first, honoring any combination of filters.
pub async fn list_records(pool: &SqlitePool, filter: &RecordFilter) -> Result<Vec<Record>> {
    let mut sql = String::from(
        "SELECT id, user, record_type, content, wine_id, created_at, updated_at \
         FROM public_records",
    );
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(wine_id) = filter.wine_id.as_deref().map(str::trim) {
        if !wine_id.is_empty() {
            clauses.push("wine_id = ?");
            binds.push(wine_id.to_string());
        }
    }
    if let Some(record_type) = filter.record_type {
        clauses.push("record_type = ?");
        binds.push(record_type.as_str().to_string());
    }
    if let Some(user) = filter.user.as_deref().map(str::trim) {
        if !user.is_empty() {
            clauses.push("user = ?");
            binds.push(user.to_string());
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut query = sqlx::query_as::<_, Record>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Like/note counts for one wine, grouped on demand — never cached.
pub async fn wine_summary(pool: &SqlitePool, wine_id: &str) -> Result<WineSummary> {
    let wine_id = wine_id.trim();
    if wine_id.is_empty() {
        return Err(RecordValidationError::MissingWineId.into());
    }

    let (like_count, note_count): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE record_type = 'like'),
            COUNT(*) FILTER (WHERE record_type = 'note')
        FROM public_records
        WHERE wine_id = ?
        "#,
    )
    .bind(wine_id)
    .fetch_one(pool)
    .await?;

    Ok(WineSummary {
        wine_id: wine_id.to_string(),
        like_count,
        note_count,
    })
}
