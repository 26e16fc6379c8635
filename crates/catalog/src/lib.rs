//! Read-only access to the wine catalog SQLite file.
//!
//! The catalog is owned externally; this crate only ever reads it. Two
//! surfaces are exposed: [`QueryExecutor`] runs statements that passed the
//! SQL gate, and [`Catalog`] answers the fixed lookups the resolver and the
//! health endpoint need (text search, card briefs, schema summary). Every
//! operation opens its own short-lived read-only connection on a blocking
//! thread.

pub mod error;
pub mod executor;

pub use error::{ExecutionError, Result};
pub use executor::{QueryExecutor, QueryResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde::Serialize;
use sqlgate::fold_case;

use crate::executor::{install_deadline, open_read_only};

/// Most tokens considered from a free-text reference.
const MAX_SEARCH_TOKENS: usize = 8;

/// Hard cap for text-search candidate lists.
const MAX_SEARCH_LIMIT: u32 = 50;

/// A single wine card in brief: enough to label it in a list and key it for
/// records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WineBrief {
    pub card_key: String,
    pub wine_name: Option<String>,
    pub producer: Option<String>,
    pub harvest_year: Option<i64>,
    pub region: Option<String>,
    pub rating_year: Option<i64>,
    pub rating_points: Option<f64>,
    pub url: Option<String>,
}

impl WineBrief {
    /// Human-readable label: name, producer, year — whichever are present.
    pub fn label(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(name) = self.wine_name.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(name.trim().to_string());
        }
        if let Some(producer) = self.producer.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(producer.trim().to_string());
        }
        if let Some(year) = self.harvest_year {
            parts.push(year.to_string());
        }
        if parts.is_empty() {
            "Unnamed wine".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Fixed lookups over the catalog table.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    table: String,
    timeout: Duration,
}

impl Catalog {
    /// Open a catalog handle for `path`. The file must already exist; the
    /// dataset is provisioned outside this system.
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            timeout,
        }
    }

    /// The catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The catalog table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build a query executor sharing this catalog's file and timeout.
    pub fn executor(&self, max_rows: u32) -> QueryExecutor {
        QueryExecutor::new(&self.path, self.timeout, max_rows)
    }

    /// Check connectivity with a trivial statement.
    pub async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await
    }

    /// Column names of the catalog table, in declared order.
    pub async fn columns(&self) -> Result<Vec<String>> {
        let table = self.table.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }

    /// One-line schema summary for /health and the model prompt.
    pub async fn schema_line(&self) -> Result<String> {
        let columns = self.columns().await?;
        Ok(format!(
            "Table: {}\nColumns: {}",
            self.table,
            columns.join(", ")
        ))
    }

    /// Whether a card exists under this identifier (card key or URL).
    pub async fn wine_exists(&self, wine_id: &str) -> Result<bool> {
        let wine_id = wine_id.trim().to_string();
        if wine_id.is_empty() {
            return Ok(false);
        }
        let table = self.table.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT 1 FROM {table} WHERE CAST(card_key AS TEXT) = ?1 OR url = ?1 LIMIT 1"
            ))?;
            let found = stmt.exists([&wine_id])?;
            Ok(found)
        })
        .await
    }

    /// Brief card lookup by identifier (card key or URL).
    pub async fn wine_brief(&self, wine_id: &str) -> Result<Option<WineBrief>> {
        let wine_id = wine_id.trim().to_string();
        if wine_id.is_empty() {
            return Ok(None);
        }
        let table = self.table.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT CAST(card_key AS TEXT), wine_name, producer, harvest_year, region, \
                 rating_year, rating_points, url \
                 FROM {table} \
                 WHERE CAST(card_key AS TEXT) = ?1 OR url = ?1 \
                 ORDER BY rating_year DESC, rating_points DESC, harvest_year DESC \
                 LIMIT 1"
            ))?;
            let mut rows = stmt.query_map([&wine_id], brief_from_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Free-text candidate search over name, producer and title.
    ///
    /// The reference is split into case-folded alphanumeric tokens; every
    /// token must match somewhere in the combined label. Ordering prefers
    /// recent ratings, matching how result lists are shown to users.
    pub async fn search_by_text(&self, reference: &str, limit: u32) -> Result<Vec<WineBrief>> {
        let tokens = search_tokens(reference);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let table = self.table.clone();
        self.with_conn(move |conn| {
            let clause = vec![
                "(COALESCE(wine_name, '') || ' ' || COALESCE(producer, '') || ' ' || \
                 COALESCE(title, '')) LIKE ?";
                tokens.len()
            ]
            .join(" AND ");
            let mut params: Vec<SqlValue> = tokens
                .iter()
                .map(|token| SqlValue::Text(format!("%{token}%")))
                .collect();
            params.push(SqlValue::Integer(i64::from(limit)));

            let mut stmt = conn.prepare(&format!(
                "SELECT CAST(card_key AS TEXT), wine_name, producer, harvest_year, region, \
                 rating_year, rating_points, url \
                 FROM {table} \
                 WHERE {clause} \
                 ORDER BY rating_year DESC, rating_points DESC, harvest_year DESC \
                 LIMIT ?"
            ))?;
            let briefs = stmt
                .query_map(rusqlite::params_from_iter(params), brief_from_row)?
                .collect::<rusqlite::Result<Vec<WineBrief>>>()?;
            Ok(briefs)
        })
        .await
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&path)?;
            install_deadline(&conn, timeout);
            op(&conn)
        })
        .await
        .map_err(|err| ExecutionError::EngineFailure(format!("catalog task failed: {err}")))?
    }
}

fn brief_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WineBrief> {
    Ok(WineBrief {
        card_key: row.get(0)?,
        wine_name: row.get(1)?,
        producer: row.get(2)?,
        harvest_year: row.get(3)?,
        region: row.get(4)?,
        rating_year: row.get(5)?,
        rating_points: row.get(6)?,
        url: row.get(7)?,
    })
}

/// Case-folded alphanumeric tokens of length >= 2, capped in count.
pub fn search_tokens(reference: &str) -> Vec<String> {
    let folded = fold_case(reference);
    let mut tokens: Vec<String> = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect();
    tokens.truncate(MAX_SEARCH_TOKENS);
    if tokens.is_empty() && !folded.trim().is_empty() {
        tokens.push(folded.trim().to_string());
    }
    tokens
}

// Fixture support shared with dependent crates' tests.
#[doc(hidden)]
pub mod test_support {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};

    use rusqlite::Connection;

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// A throwaway catalog file seeded with a few cards.
    pub struct FixtureCatalog {
        path: PathBuf,
    }

    impl FixtureCatalog {
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for FixtureCatalog {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    pub fn fixture_catalog() -> FixtureCatalog {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "catalog-fixture-{}-{n}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE wine_cards_wide (
                card_key INTEGER PRIMARY KEY,
                wine_name TEXT,
                producer TEXT,
                title TEXT,
                harvest_year INTEGER,
                region TEXT,
                rating_year INTEGER,
                rating_points REAL,
                url TEXT
            );
            INSERT INTO wine_cards_wide VALUES
                (1, 'Мерло Резерв', 'Винодельня Юг', 'Мерло Резерв 2019',
                 2019, 'Кубань', 2022, 89.0, 'https://wine.example/cards/1'),
                (2, 'Pinot Noir Grand', 'Winery North', 'Pinot Noir Grand 2020',
                 2020, 'Крым', 2023, 92.5, 'https://wine.example/cards/2'),
                (3, 'Каберне Совиньон', 'Винодельня Юг', 'Каберне Совиньон 2018',
                 2018, 'Кубань', 2021, 85.0, 'https://wine.example/cards/3');
            "#,
        )
        .unwrap();
        drop(conn);

        FixtureCatalog { path }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::fixture_catalog;
    use super::*;

    fn catalog(path: &Path) -> Catalog {
        Catalog::new(path, "wine_cards_wide", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_ping_and_columns() {
        let fixture = fixture_catalog();
        let catalog = catalog(fixture.path());

        catalog.ping().await.unwrap();
        let columns = catalog.columns().await.unwrap();
        assert!(columns.contains(&"wine_name".to_string()));
        assert!(catalog.schema_line().await.unwrap().contains("wine_cards_wide"));
    }

    #[tokio::test]
    async fn test_wine_exists_by_key_and_url() {
        let fixture = fixture_catalog();
        let catalog = catalog(fixture.path());

        assert!(catalog.wine_exists("1").await.unwrap());
        assert!(catalog
            .wine_exists("https://wine.example/cards/2")
            .await
            .unwrap());
        assert!(!catalog.wine_exists("999").await.unwrap());
        assert!(!catalog.wine_exists("  ").await.unwrap());
    }

    #[tokio::test]
    async fn test_wine_brief() {
        let fixture = fixture_catalog();
        let catalog = catalog(fixture.path());

        let brief = catalog.wine_brief("2").await.unwrap().unwrap();
        assert_eq!(brief.wine_name.as_deref(), Some("Pinot Noir Grand"));
        assert_eq!(brief.label(), "Pinot Noir Grand, Winery North, 2020");
        assert!(catalog.wine_brief("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_text_folds_case() {
        let fixture = fixture_catalog();
        let catalog = catalog(fixture.path());

        let hits = catalog.search_by_text("МЕРЛО", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].card_key, "1");

        let hits = catalog.search_by_text("pinot grand", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = catalog.search_by_text("юг", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        assert!(catalog.search_by_text("  ", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_search_tokens() {
        assert_eq!(search_tokens("Мерло 2019!"), vec!["мерло", "2019"]);
        // Too-short tokens fall back to the whole folded reference.
        assert_eq!(search_tokens("a b"), vec!["a b"]);
        assert!(search_tokens("").is_empty());
    }
}
