//! Capabilities endpoint: static text describing what the service can do.

use axum::extract::State;

use crate::state::AppState;

/// Serve the configured capabilities text as-is.
pub async fn capabilities(State(state): State<AppState>) -> String {
    state.capabilities.to_string()
}
