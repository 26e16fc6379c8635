//! Application state shared across handlers.

use std::sync::Arc;

use assistant::Assistant;
use catalog::Catalog;
use records::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Chat orchestration.
    pub assistant: Arc<Assistant>,
    /// Records database.
    pub records: Database,
    /// Wine catalog lookups.
    pub catalog: Catalog,
    /// Text served at /capabilities.
    pub capabilities: Arc<str>,
    /// Header carrying the external user id.
    pub external_id_header: String,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        assistant: Arc<Assistant>,
        records: Database,
        catalog: Catalog,
        capabilities: impl Into<Arc<str>>,
        external_id_header: impl Into<String>,
    ) -> Self {
        Self {
            assistant,
            records,
            catalog,
            capabilities: capabilities.into(),
            external_id_header: external_id_header.into(),
        }
    }
}
