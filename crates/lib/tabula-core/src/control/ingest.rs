use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use super::{
    ControlError,
    ControlResult,
    TabulaControlPlane,
    map_engine,
    quote_identifier,
    quote_literal,
    validate_identifier,
};

const SHEETS_HOST_MARKER: &str = "docs.google.com/spreadsheets";

/// Result of importing a CSV source into a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCsvReport {
    pub success: bool,
    pub message: String,
    pub table_name: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl TabulaControlPlane {
    /// Imports a CSV source (HTTP(S) URL, Google Sheets sharing URL, or local
    /// path) into `table_name`, replacing any existing table of that name.
    /// Column names come from the header row; types are inferred by DuckDB.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidIdentifier` for a rejected table name,
    /// `SourceFetch` on network/file access failure, `Parse` when scanning
    /// the staged CSV fails, and `Database` when table creation or the
    /// post-import catalog reads fail.
    pub async fn import_csv(&self, source: &str, table_name: &str) -> ControlResult<ImportCsvReport> {
        validate_identifier(table_name)?;
        let resolved = resolve_source_url(source);
        let staged = stage_source(&resolved).await?;
        let Some(staged_path) = staged.path().to_str() else {
            return Err(ControlError::SourceFetch(format!(
                "source path is not valid UTF-8: {}",
                staged.path().display()
            )));
        };

        // Scan the CSV on its own first so malformed input classifies as a
        // parse failure; anything the CREATE itself rejects afterwards is an
        // engine-level database error. The scan doubles as the row count.
        let source_literal = quote_literal(staged_path);
        let probe = format!("SELECT count(*) FROM read_csv_auto({source_literal})");
        let counted = self
            .engine()
            .query_count(&probe)
            .await
            .map_err(|err| map_engine(err, ControlError::Parse))?;
        let row_count = usize::try_from(counted).unwrap_or_default();

        // Replace semantics: last write wins, never merge.
        let create = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto({source_literal})",
            quote_identifier(table_name),
        );
        self.engine()
            .execute_batch(&create)
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;

        let columns = self.table_columns(table_name).await?;
        info!("imported {row_count} rows into table '{table_name}'");

        Ok(ImportCsvReport {
            success: true,
            message: format!("Successfully imported {row_count} rows into table '{table_name}'"),
            table_name: table_name.to_string(),
            row_count,
            columns,
        })
    }

    pub(crate) async fn count_table_rows(&self, table_name: &str) -> ControlResult<usize> {
        let sql = format!("SELECT count(*) FROM {}", quote_identifier(table_name));
        let count = self
            .engine()
            .query_count(&sql)
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn table_columns(&self, table_name: &str) -> ControlResult<Vec<String>> {
        let sql = format!("DESCRIBE {}", quote_identifier(table_name));
        let output = self
            .engine()
            .query_rows(&sql)
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        Ok(output
            .rows
            .iter()
            .filter_map(|row| row.get("column_name").and_then(serde_json::Value::as_str))
            .map(ToString::to_string)
            .collect())
    }
}

/// Rewrites a Google Sheets sharing URL to its CSV export endpoint. The
/// document id is the path segment immediately after `/d/`. Anything that
/// does not match the recognized shape passes through unchanged and fails
/// downstream instead.
pub(crate) fn resolve_source_url(source: &str) -> String {
    if !source.contains(SHEETS_HOST_MARKER) {
        return source.to_string();
    }
    let Some((_, rest)) = source.split_once("/d/") else {
        return source.to_string();
    };
    match rest.split('/').next() {
        Some(doc_id) if !doc_id.is_empty() => {
            format!("https://docs.google.com/spreadsheets/d/{doc_id}/export?format=csv")
        }
        _ => source.to_string(),
    }
}

/// A readable CSV file on local disk: either the caller's own path or a temp
/// file holding a fetched remote body. The temp file lives until the staged
/// source is dropped.
#[derive(Debug)]
enum StagedSource {
    Local(PathBuf),
    Fetched(NamedTempFile),
}

impl StagedSource {
    fn path(&self) -> &Path {
        match self {
            Self::Local(path) => path,
            Self::Fetched(file) => file.path(),
        }
    }
}

async fn stage_source(resolved: &str) -> ControlResult<StagedSource> {
    if resolved.starts_with("http://") || resolved.starts_with("https://") {
        let response = reqwest::get(resolved)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| ControlError::SourceFetch(err.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| ControlError::SourceFetch(err.to_string()))?;

        let mut file = tempfile::Builder::new()
            .prefix("tabula-import-")
            .suffix(".csv")
            .tempfile()
            .map_err(|err| ControlError::SourceFetch(err.to_string()))?;
        file.write_all(&body)
            .and_then(|()| file.flush())
            .map_err(|err| ControlError::SourceFetch(err.to_string()))?;
        Ok(StagedSource::Fetched(file))
    } else {
        let path = Path::new(resolved);
        if path.is_file() {
            Ok(StagedSource::Local(path.to_path_buf()))
        } else {
            Err(ControlError::SourceFetch(format!(
                "no such file: {resolved}"
            )))
        }
    }
}
