use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::{ControlError, ControlResult, TabulaControlPlane, map_engine, quote_literal};

/// Default row ceiling applied when a query carries no limiting clause.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Materialized result of an ad-hoc query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub success: bool,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub data: Vec<Map<String, Value>>,
}

/// Result of exporting a query to a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub success: bool,
    pub message: String,
    pub row_count: usize,
    pub output_path: String,
}

impl TabulaControlPlane {
    /// Runs `query` against the shared connection, appending ` LIMIT <limit>`
    /// when the text carries no limiting clause, and materializes the result.
    ///
    /// # Errors
    /// Returns `ControlError::Query` with DuckDB's diagnostic preserved, or
    /// `ConnectionInit` if the connection cannot be established.
    pub async fn query_data(&self, query: &str, limit: usize) -> ControlResult<QueryReport> {
        let sql = apply_row_limit(query, limit);
        let output = self
            .engine()
            .query_rows(&sql)
            .await
            .map_err(|err| map_engine(err, ControlError::Query))?;
        Ok(QueryReport {
            success: true,
            row_count: output.rows.len(),
            columns: output.columns,
            data: output.rows,
        })
    }

    /// Runs `query` without limit injection and writes the full result set to
    /// `output_path` as CSV with a header row, overwriting any existing file.
    ///
    /// # Errors
    /// Returns `ControlError::Query` if the query text does not prepare, and
    /// `ControlError::Write` if the COPY to disk fails.
    pub async fn export_query_results(
        &self,
        query: &str,
        output_path: &str,
    ) -> ControlResult<ExportReport> {
        let trimmed = trim_statement(query);
        // Prepare first so query mistakes classify as query errors, leaving
        // the COPY step to surface only I/O failures.
        self.engine()
            .validate_query(trimmed)
            .await
            .map_err(|err| map_engine(err, ControlError::Query))?;

        let copy = format!(
            "COPY ({trimmed}) TO {} (HEADER, DELIMITER ',')",
            quote_literal(output_path)
        );
        let count = self
            .engine()
            .query_count(&copy)
            .await
            .map_err(|err| map_engine(err, ControlError::Write))?;
        let row_count = usize::try_from(count).unwrap_or_default();
        info!("exported {row_count} rows to {output_path}");

        Ok(ExportReport {
            success: true,
            message: format!("Exported {row_count} rows to {output_path}"),
            row_count,
            output_path: output_path.to_string(),
        })
    }
}

fn trim_statement(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

/// Appends a LIMIT clause unless the query already contains one.
///
/// Detection is a case-insensitive substring match, not a parse: a LIMIT
/// embedded in a sub-expression or string literal suppresses the ceiling.
fn apply_row_limit(query: &str, limit: usize) -> String {
    let trimmed = trim_statement(query);
    if trimmed.to_uppercase().contains("LIMIT") {
        trimmed.to_string()
    } else {
        format!("{trimmed} LIMIT {limit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_appended_when_absent() {
        assert_eq!(
            apply_row_limit("SELECT * FROM t", 100),
            "SELECT * FROM t LIMIT 100"
        );
    }

    #[test]
    fn trailing_semicolon_is_stripped_before_appending() {
        assert_eq!(
            apply_row_limit("SELECT * FROM t;  ", 5),
            "SELECT * FROM t LIMIT 5"
        );
    }

    #[test]
    fn existing_limit_is_left_alone() {
        assert_eq!(
            apply_row_limit("SELECT * FROM t limit 3", 100),
            "SELECT * FROM t limit 3"
        );
    }

    #[test]
    fn substring_heuristic_false_positive_suppresses_the_ceiling() {
        // "limit" inside a string literal defeats the substring check; the
        // ceiling is intentionally not enforced for such queries.
        let query = "SELECT * FROM t WHERE note = 'no limit'";
        assert_eq!(apply_row_limit(query, 100), query);
    }
}
