//! Wine catalog chat server.
//!
//! Serves the records API, the chat endpoint, and the health/capabilities
//! probes over one axum router.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use assistant::{Assistant, ChatModelBrain};
use catalog::Catalog;
use records::Database;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting wine chat server");

    // Records database: created and migrated on startup.
    let db = Database::connect(&config.records_url).await?;
    db.migrate().await?;

    // Wine catalog: provisioned externally, must already be readable.
    let catalog = Catalog::new(
        &config.catalog_path,
        &config.catalog_table,
        config.query_timeout,
    );
    catalog.ping().await?;
    info!(
        path = %config.catalog_path,
        table = %config.catalog_table,
        "Wine catalog opened"
    );

    let brain = ChatModelBrain::from_env()?;
    let assistant = Assistant::new(
        Arc::new(brain),
        catalog.clone(),
        db.clone(),
        config.row_ceiling,
    );

    let capabilities = std::fs::read_to_string(&config.capabilities_path).unwrap_or_else(|err| {
        warn!(
            path = %config.capabilities_path,
            %err,
            "Capabilities file not readable, serving a stub"
        );
        "Wine catalog chat: ask about wines, like them, and leave notes.".to_string()
    });

    // Build application state
    let state = AppState::new(
        Arc::new(assistant),
        db,
        catalog,
        capabilities,
        config.external_id_header.clone(),
    );

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Wine chat server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
