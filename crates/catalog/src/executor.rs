//! Bounded, read-only execution of gated statements.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use sqlgate::{like_match, ValidatedStatement};

use crate::error::{ExecutionError, Result};

/// How often (in VM instructions) the progress handler checks the deadline.
const PROGRESS_STEP: i32 = 1_000;

/// Ordered result of one executed statement.
///
/// Column order matches the statement's projection; each row holds values in
/// the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// View a row as `(column, value)` pairs in projection order.
    pub fn row_pairs<'a>(&'a self, row: &'a [Value]) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns.iter().map(String::as_str).zip(row.iter())
    }
}

/// Executes validated statements against the catalog file.
///
/// Every call opens its own short-lived read-only connection on a blocking
/// thread; the connection factory configured here installs the Unicode
/// `like()` override and the query deadline on each one. Rows are capped at
/// the ceiling while being read, independent of the statement's own LIMIT.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    path: PathBuf,
    timeout: Duration,
    max_rows: u32,
}

impl QueryExecutor {
    /// Create an executor for the catalog at `path`.
    pub fn new(path: impl Into<PathBuf>, timeout: Duration, max_rows: u32) -> Self {
        Self {
            path: path.into(),
            timeout,
            max_rows: max_rows.max(1),
        }
    }

    /// The row ceiling this executor enforces.
    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// Execute a gated statement and collect its rows.
    pub async fn execute(&self, statement: &ValidatedStatement) -> Result<QueryResult> {
        let path = self.path.clone();
        let timeout = self.timeout;
        let cap = self.max_rows as usize;
        let sql = statement.sql().to_string();

        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || -> Result<QueryResult> {
            let conn = open_read_only(&path)?;
            install_deadline(&conn, timeout);

            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect();
            let column_count = columns.len();

            let mut rows = Vec::new();
            let mut cursor = stmt.query([])?;
            while let Some(row) = cursor.next()? {
                let mut values = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    values.push(json_value(row.get_ref(idx)?));
                }
                rows.push(values);
                if rows.len() >= cap {
                    break;
                }
            }

            Ok(QueryResult { columns, rows })
        })
        .await
        .map_err(|err| ExecutionError::EngineFailure(format!("executor task failed: {err}")))??;

        tracing::debug!(
            rows = result.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog query executed"
        );
        Ok(result)
    }
}

/// Open the catalog file with read-only semantics at every layer: the open
/// flag blocks writes at the VFS, `query_only` blocks them at the VM.
pub(crate) fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.pragma_update(None, "query_only", true)?;
    register_unicode_like(&conn)?;
    Ok(conn)
}

/// Abort any statement still running past `timeout`.
pub(crate) fn install_deadline(conn: &Connection, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    conn.progress_handler(
        PROGRESS_STEP,
        Some(move || Instant::now() >= deadline),
    );
}

/// Override the built-in `like()` with the Unicode case-folding comparison,
/// so the `LIKE` operator matches Cyrillic and Latin text regardless of
/// case. Registered per connection, configured once at executor creation.
pub(crate) fn register_unicode_like(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "like",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match (text_arg(ctx, 0), text_arg(ctx, 1)) {
                (Some(pattern), Some(text)) => Some(like_match(&pattern, &text, None)),
                _ => None,
            })
        },
    )?;
    conn.create_scalar_function(
        "like",
        3,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let escape = text_arg(ctx, 2).and_then(|s| s.chars().next());
            Ok(match (text_arg(ctx, 0), text_arg(ctx, 1)) {
                (Some(pattern), Some(text)) => Some(like_match(&pattern, &text, escape)),
                _ => None,
            })
        },
    )?;
    Ok(())
}

/// Coerce a function argument to text the way SQLite's own like() does;
/// NULL stays NULL.
fn text_arg(ctx: &rusqlite::functions::Context<'_>, idx: usize) -> Option<String> {
    use rusqlite::types::ValueRef;
    match ctx.get_raw(idx) {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

fn json_value(value: rusqlite::types::ValueRef<'_>) -> Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}
