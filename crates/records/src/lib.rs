//! SQLite persistence for public wine records.
//!
//! This crate owns the append-only `public_records` table: likes and notes
//! users attach to wine cards. Records are immutable history — there is no
//! update or delete path — and per-wine summaries are always computed from
//! the current rows.
//!
//! # Example
//!
//! ```no_run
//! use records::{record, Database, NewRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:wine_social.sqlite?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let created = record::create_record(
//!         db.pool(),
//!         NewRecord {
//!             user: "Anna",
//!             record_type: "like",
//!             content: None,
//!             wine_id: "1024",
//!         },
//!     )
//!     .await?;
//!     println!("record #{}", created.id);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod record;
pub mod user;

pub use error::{RecordValidationError, RecordsError, Result};
pub use models::{Record, RecordType, WineSummary};
pub use record::{NewRecord, RecordFilter, LIKE_DEFAULT_CONTENT};
pub use user::{effective_user, EXTERNAL_USER_PREFIX, GUEST_USER};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`;
    /// `?mode=rwc` creates the file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        // An in-memory database exists per connection; keep the pool at one
        // so every query sees the same schema.
        let pool_size = if url.contains(":memory:") { 1 } else { pool_size };

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url, pool_size, "Connected to records database");

        Ok(Self { pool })
    }

    /// Run database migrations. Call once after connecting.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Check connectivity with a trivial statement.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_and_migrate() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db.ping().await.unwrap();

        // Migration is idempotent.
        db.migrate().await.unwrap();
        db.close().await;
    }
}
