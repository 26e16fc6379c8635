//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub records: String,
    pub catalog: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Ping both stores and report the catalog schema.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let records = state.records.ping().await;
    let catalog = state.catalog.ping().await;
    let schema = state.catalog.schema_line().await.ok();

    let status = if records.is_ok() && catalog.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(Health {
        status: status.to_string(),
        records: probe(records.map_err(|e| e.to_string())),
        catalog: probe(catalog.map_err(|e| e.to_string())),
        schema,
    })
}

fn probe(result: Result<(), String>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(message) => message,
    }
}
