use std::{error::Error, fmt};

use crate::engine::{DuckDbEngine, EngineError, EngineMode};

pub mod data;
pub mod ingest;
pub mod metadata;

pub use data::{DEFAULT_QUERY_LIMIT, ExportReport, QueryReport};
pub use ingest::ImportCsvReport;
pub use metadata::{
    DescribeTableReport,
    ListTablesReport,
    TableResource,
    TableStatsReport,
    TableSummary,
};

/// Failure classes surfaced to the MCP boundary. Engine diagnostics are
/// preserved verbatim inside each variant; nothing is retried internally.
#[derive(Debug)]
pub enum ControlError {
    ConnectionInit(String),
    SourceFetch(String),
    Parse(String),
    Query(String),
    NotFound(String),
    Write(String),
    InvalidIdentifier(String),
    Database(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionInit(message) => {
                write!(f, "connection initialization failed: {message}")
            }
            Self::SourceFetch(message) => write!(f, "source fetch failed: {message}"),
            Self::Parse(message) => write!(f, "CSV parse failed: {message}"),
            Self::Query(message) => write!(f, "query failed: {message}"),
            Self::NotFound(table) => write!(f, "table not found: {table}"),
            Self::Write(message) => write!(f, "export write failed: {message}"),
            Self::InvalidIdentifier(name) => write!(
                f,
                "invalid table name '{name}': only letters, digits, and underscores are allowed"
            ),
            Self::Database(message) => write!(f, "database error: {message}"),
        }
    }
}

impl Error for ControlError {}

pub type ControlResult<T> = Result<T, ControlError>;

/// Maps an engine failure into a control-level class. Initialization
/// failures keep their own class regardless of the operation that hit them.
pub(crate) fn map_engine(err: EngineError, class: fn(String) -> ControlError) -> ControlError {
    match err {
        EngineError::Init(message) => ControlError::ConnectionInit(message),
        EngineError::Duck(inner) => class(inner.to_string()),
    }
}

/// Rejects table names that are not `[A-Za-z_][A-Za-z0-9_]*` before they are
/// interpolated into generated SQL.
pub(crate) fn validate_identifier(name: &str) -> ControlResult<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| {
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(ControlError::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quotes an identifier for interpolation, doubling embedded quotes.
/// Catalog-sourced names (e.g. from SHOW TABLES) reach this without passing
/// the whitelist, so quoting must stand on its own.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a string literal, doubling embedded quotes.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Control plane over the shared DuckDB engine. One instance per process;
/// every operation obtains the connection through the engine, creating it on
/// first use.
#[derive(Clone)]
pub struct TabulaControlPlane {
    engine: DuckDbEngine,
}

impl TabulaControlPlane {
    #[must_use]
    pub fn new(engine: DuckDbEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub const fn engine(&self) -> &DuckDbEngine {
        &self.engine
    }

    #[must_use]
    pub const fn mode(&self) -> EngineMode {
        self.engine.mode()
    }

    /// Drops the cached connection so the next operation reconnects. There is
    /// no automatic recovery of a dead handle; this is the explicit path.
    pub async fn reset_connection(&self) -> bool {
        self.engine.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_whitelist() {
        assert!(validate_identifier("sales_2024").is_ok());
        assert!(validate_identifier("_t").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1st").is_err());
        assert!(validate_identifier("t;DROP TABLE x").is_err());
        assert!(validate_identifier("t\"name").is_err());
    }

    #[test]
    fn literal_quoting_doubles_embedded_quotes() {
        assert_eq!(quote_literal("a'b"), "'a''b'");
        assert_eq!(quote_identifier("t"), "\"t\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
