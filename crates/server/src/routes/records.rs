//! Public records API: create, list, per-wine summary.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use records::{
    effective_user, record, NewRecord, Record, RecordFilter, RecordType, RecordValidationError,
    RecordsError, WineSummary,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routes::external_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRecordBody {
    pub user: Option<String>,
    pub external_user_id: Option<String>,
    pub record_type: String,
    pub content: Option<String>,
    pub wine_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub wine_id: Option<String>,
    pub record_type: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ByWineResponse {
    pub summary: WineSummary,
    pub count: usize,
    pub records: Vec<Record>,
}

/// POST /api/records — append one record, 201 on success.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateRecordBody>,
) -> Result<(StatusCode, Json<Record>)> {
    // A wine_id that names nothing is a user mistake, caught before insert.
    // An empty one falls through to the store's own MissingWineId check.
    let wine_id = body.wine_id.trim();
    if !wine_id.is_empty() && !state.catalog.wine_exists(wine_id).await? {
        return Err(RecordsError::Validation(RecordValidationError::UnknownWine {
            wine_id: wine_id.to_string(),
        })
        .into());
    }

    let external = external_id(
        &headers,
        &state.external_id_header,
        body.external_user_id.as_deref(),
    );
    let user = effective_user(body.user.as_deref(), external.as_deref());

    let record = record::create_record(
        state.records.pool(),
        NewRecord {
            user: &user,
            record_type: &body.record_type,
            content: body.content.as_deref(),
            wine_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/records — list with optional filters.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let record_type = params
        .record_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RecordType::parse)
        .transpose()
        .map_err(RecordsError::Validation)?;

    let records = record::list_records(
        state.records.pool(),
        &RecordFilter {
            wine_id: params.wine_id,
            record_type,
            user: params.user,
        },
    )
    .await?;

    Ok(Json(ListResponse {
        count: records.len(),
        records,
    }))
}

/// GET /api/records/by-wine/:wine_id — summary plus full history.
pub async fn by_wine(
    State(state): State<AppState>,
    Path(wine_id): Path<String>,
) -> Result<Json<ByWineResponse>> {
    let summary = record::wine_summary(state.records.pool(), &wine_id).await?;
    let records = record::list_records(
        state.records.pool(),
        &RecordFilter {
            wine_id: Some(wine_id),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(ByWineResponse {
        summary,
        count: records.len(),
        records,
    }))
}
