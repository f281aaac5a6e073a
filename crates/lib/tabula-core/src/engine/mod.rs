//! DuckDB engine wrapper.
//!
//! Owns the single process-wide connection, created lazily on first use and
//! reused for the process lifetime. A `MotherDuck` token switches the engine
//! into remote-authenticated mode; without one it runs in-memory.

mod value;

use std::{error::Error, fmt, sync::Arc};

use duckdb::{Connection, Statement, params};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use value::value_ref_to_json;

#[derive(Debug)]
pub enum EngineError {
    Init(String),
    Duck(duckdb::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(message) => write!(f, "connection initialization failed: {message}"),
            Self::Duck(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {}

impl From<duckdb::Error> for EngineError {
    fn from(err: duckdb::Error) -> Self {
        Self::Duck(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Connection mode derived from the environment credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Attached to a hosted MotherDuck database by token.
    Remote,
    /// Ephemeral in-memory database, no persistence beyond the process.
    Local,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Engine configuration, read once at process start.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub motherduck_token: Option<String>,
}

impl EngineConfig {
    #[must_use]
    pub const fn mode(&self) -> EngineMode {
        if self.motherduck_token.is_some() {
            EngineMode::Remote
        } else {
            EngineMode::Local
        }
    }
}

/// Materialized result of a query: ordered column names plus rows shaped as
/// column-name-to-value mappings.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Shared handle to the DuckDB engine.
///
/// At most one live connection exists per engine; all operations serialize on
/// the internal mutex. A failed initialization caches nothing, so the next
/// call retries from scratch.
#[derive(Clone)]
pub struct DuckDbEngine {
    config: EngineConfig,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl DuckDbEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> EngineMode {
        self.config.mode()
    }

    /// Discards the cached connection, if any. The next operation reconnects.
    ///
    /// Returns `true` if a live connection was dropped.
    pub async fn reset(&self) -> bool {
        let mut guard = self.conn.lock().await;
        guard.take().is_some()
    }

    /// Reports whether a connection is currently established, without
    /// creating one.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Runs `sql` and materializes every result row.
    ///
    /// # Errors
    /// Returns `EngineError` if initialization or execution fails.
    pub async fn query_rows(&self, sql: &str) -> EngineResult<QueryOutput> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            let columns: Vec<String> = rows
                .as_ref()
                .map(Statement::column_names)
                .unwrap_or_default();
            let mut shaped = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Map::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), value_ref_to_json(row.get_ref(idx)?));
                }
                shaped.push(record);
            }
            Ok(QueryOutput {
                columns,
                rows: shaped,
            })
        })
        .await
    }

    /// Runs one or more statements, discarding any results.
    ///
    /// # Errors
    /// Returns `EngineError` if initialization or execution fails.
    pub async fn execute_batch(&self, sql: &str) -> EngineResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
        .await
    }

    /// Runs `sql` and returns the first column of the first row as a count.
    ///
    /// # Errors
    /// Returns `EngineError` if initialization or execution fails.
    pub async fn query_count(&self, sql: &str) -> EngineResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(sql, [], |row| row.get::<_, i64>(0))?;
            Ok(count)
        })
        .await
    }

    /// Checks whether `table_name` exists in the current catalog, using a
    /// parameterized lookup rather than identifier interpolation.
    ///
    /// # Errors
    /// Returns `EngineError` if initialization or the lookup fails.
    pub async fn table_exists(&self, table_name: &str) -> EngineResult<bool> {
        let table_name = table_name.to_string();
        self.with_conn(move |conn| {
            let count = conn.query_row(
                "SELECT count(*) FROM duckdb_tables() WHERE table_name = ?",
                params![table_name],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    /// Prepares `sql` without executing it, surfacing syntax and binding
    /// errors (unknown tables/columns, type mismatches).
    ///
    /// # Errors
    /// Returns `EngineError` if initialization or preparation fails.
    pub async fn validate_query(&self, sql: &str) -> EngineResult<()> {
        self.with_conn(|conn| {
            let _stmt = conn.prepare(sql)?;
            Ok(())
        })
        .await
    }

    async fn with_conn<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&Connection) -> EngineResult<T>,
    {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            *guard = Some(self.open_connection()?);
        }
        let conn = guard
            .as_ref()
            .ok_or_else(|| EngineError::Init("connection unavailable".to_string()))?;
        op(conn)
    }

    fn open_connection(&self) -> EngineResult<Connection> {
        match self.config.motherduck_token.as_deref() {
            Some(token) => Connection::open(format!("md:?motherduck_token={token}"))
                .map_err(|err| EngineError::Init(format!("MotherDuck attach failed: {err}"))),
            None => Connection::open_in_memory()
                .map_err(|err| EngineError::Init(format!("in-memory open failed: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_engine() -> DuckDbEngine {
        DuckDbEngine::new(EngineConfig::default())
    }

    #[test]
    fn mode_follows_token_presence() {
        assert_eq!(local_engine().mode(), EngineMode::Local);

        let remote = DuckDbEngine::new(EngineConfig {
            motherduck_token: Some("tok".to_string()),
        });
        assert_eq!(remote.mode(), EngineMode::Remote);
    }

    #[tokio::test]
    async fn connection_is_lazy_and_reused() {
        let engine = local_engine();
        assert!(!engine.is_connected().await);

        let count = engine.query_count("SELECT 41 + 1").await.expect("query");
        assert_eq!(count, 42);
        assert!(engine.is_connected().await);

        engine
            .execute_batch("CREATE TABLE scratch AS SELECT 1 AS n")
            .await
            .expect("create");
        assert!(engine.table_exists("scratch").await.expect("exists"));
    }

    #[tokio::test]
    async fn reset_discards_the_handle() {
        let engine = local_engine();
        assert!(!engine.reset().await);

        let _ = engine.query_count("SELECT 1").await.expect("query");
        assert!(engine.reset().await);
        assert!(!engine.is_connected().await);

        // In-memory state is gone after a reset.
        assert!(!engine.table_exists("scratch").await.expect("exists"));
    }

    #[tokio::test]
    async fn query_rows_shapes_columns_and_records() {
        let engine = local_engine();
        let output = engine
            .query_rows("SELECT 1 AS id, 'ada' AS name UNION ALL SELECT 2, 'grace' ORDER BY id")
            .await
            .expect("query");

        assert_eq!(output.columns, vec!["id", "name"]);
        assert_eq!(output.rows.len(), 2);
        assert_eq!(output.rows[0]["name"], Value::String("ada".to_string()));
        assert_eq!(output.rows[1]["id"], Value::from(2));
    }

    #[tokio::test]
    async fn query_rows_with_empty_result_still_reports_columns() {
        let engine = local_engine();
        let output = engine
            .query_rows("SELECT 1 AS id WHERE 1 = 0")
            .await
            .expect("query");
        assert_eq!(output.columns, vec!["id"]);
        assert!(output.rows.is_empty());
    }

    #[tokio::test]
    async fn validate_query_rejects_unknown_tables() {
        let engine = local_engine();
        let err = engine
            .validate_query("SELECT * FROM no_such_table")
            .await
            .expect_err("should fail");
        assert!(matches!(err, EngineError::Duck(_)));
    }
}
