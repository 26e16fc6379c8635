//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Header carrying the caller's external user id.
pub const DEFAULT_EXTERNAL_ID_HEADER: &str = "X-External-User-Id";

/// Wine chat server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Path to the read-only wine catalog SQLite file.
    pub catalog_path: String,
    /// Catalog table name.
    pub catalog_table: String,
    /// SQLite URL for the records database.
    pub records_url: String,
    /// Maximum rows any gated query may return.
    pub row_ceiling: u32,
    /// Per-query execution deadline.
    pub query_timeout: Duration,
    /// Path to the capabilities text served at /capabilities.
    pub capabilities_path: String,
    /// Header name for the external user id.
    pub external_id_header: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WINECHAT_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `WINE_DB_PATH` | Wine catalog SQLite file | (required) |
    /// | `WINE_TABLE` | Catalog table name | `wine_cards_wide` |
    /// | `RECORDS_DB_URL` | Records SQLite URL | `sqlite:wine_records.db?mode=rwc` |
    /// | `ROW_CEILING` | Max rows per gated query | `200` |
    /// | `QUERY_TIMEOUT_SECS` | Per-query deadline, seconds | `5` |
    /// | `CAPABILITIES_PATH` | Capabilities text file | `CAPABILITIES.md` |
    /// | `EXTERNAL_ID_HEADER` | External user id header | `X-External-User-Id` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("WINECHAT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let catalog_path = env::var("WINE_DB_PATH").map_err(|_| ConfigError::MissingWineDbPath)?;

        let catalog_table =
            env::var("WINE_TABLE").unwrap_or_else(|_| "wine_cards_wide".to_string());

        let records_url = env::var("RECORDS_DB_URL")
            .unwrap_or_else(|_| "sqlite:wine_records.db?mode=rwc".to_string());

        let row_ceiling = env::var("ROW_CEILING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200);

        let query_timeout = env::var("QUERY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        let capabilities_path =
            env::var("CAPABILITIES_PATH").unwrap_or_else(|_| "CAPABILITIES.md".to_string());

        let external_id_header = env::var("EXTERNAL_ID_HEADER")
            .unwrap_or_else(|_| DEFAULT_EXTERNAL_ID_HEADER.to_string());

        Ok(Self {
            addr,
            catalog_path,
            catalog_table,
            records_url,
            row_ceiling,
            query_timeout,
            capabilities_path,
            external_id_header,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WINECHAT_ADDR format")]
    InvalidAddr,

    #[error("WINE_DB_PATH environment variable is required")]
    MissingWineDbPath,
}
