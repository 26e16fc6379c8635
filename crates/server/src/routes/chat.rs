//! Chat endpoint: one message in, one assistant reply out.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use records::{effective_user, EXTERNAL_USER_PREFIX};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routes::external_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
    pub user: Option<String>,
    pub external_user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat — run one message through the assistant.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>> {
    let external = external_id(
        &headers,
        &state.external_id_header,
        body.external_user_id.as_deref(),
    );
    let user = effective_user(body.user.as_deref(), external.as_deref());

    // Context follows the external id when there is one, so the same person
    // keeps their list regardless of what display name they send.
    let user_key = match external {
        Some(id) => format!("{EXTERNAL_USER_PREFIX}{id}"),
        None => user.clone(),
    };

    let reply = state.assistant.handle(&user_key, &user, &body.message).await?;
    Ok(Json(ChatResponse { reply }))
}
