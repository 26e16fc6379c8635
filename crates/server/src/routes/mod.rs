//! Route handlers for the wine chat server.

pub mod capabilities;
pub mod chat;
pub mod health;
pub mod records;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health and capability probes
        .route("/health", get(health::health))
        .route("/capabilities", get(capabilities::capabilities))
        // Records API
        .route("/api/records", post(records::create).get(records::list))
        .route("/api/records/by-wine/:wine_id", get(records::by_wine))
        // Chat
        .route("/chat", post(chat::chat))
}

/// External user id: the configured header wins over the request body.
pub(crate) fn external_id(
    headers: &HeaderMap,
    header_name: &str,
    from_body: Option<&str>,
) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            from_body
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}
