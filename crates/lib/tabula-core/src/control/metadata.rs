use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    ControlError,
    ControlResult,
    TabulaControlPlane,
    map_engine,
    quote_identifier,
    validate_identifier,
};

const SAMPLE_ROWS: usize = 5;
const RESOURCE_SAMPLE_ROWS: usize = 10;

/// One catalog entry: a table and its current row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_name: String,
    pub row_count: usize,
}

/// Result of enumerating the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTablesReport {
    pub success: bool,
    pub table_count: usize,
    pub tables: Vec<TableSummary>,
}

/// Schema, sample rows, and row count for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeTableReport {
    pub success: bool,
    pub table_name: String,
    pub row_count: usize,
    pub schema: Vec<Map<String, Value>>,
    pub sample_data: Vec<Map<String, Value>>,
}

/// Per-column summary statistics, returned as DuckDB's SUMMARIZE emits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatsReport {
    pub success: bool,
    pub table_name: String,
    pub statistics: Vec<Map<String, Value>>,
}

/// Resource payload for the `table://{table_name}` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResource {
    pub table_name: String,
    pub schema: Vec<Map<String, Value>>,
    pub sample_data: Vec<Map<String, Value>>,
    pub row_count: usize,
}

impl TabulaControlPlane {
    /// Enumerates every table with its row count. Cost is one count scan per
    /// table; fine for exploratory catalogs, not large ones.
    ///
    /// # Errors
    /// Returns `ControlError::Database` if the catalog reads fail.
    pub async fn list_tables(&self) -> ControlResult<ListTablesReport> {
        let output = self
            .engine()
            .query_rows("SHOW TABLES")
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;

        let mut tables = Vec::with_capacity(output.rows.len());
        for row in &output.rows {
            let Some(table_name) = row.get("name").and_then(Value::as_str) else {
                continue;
            };
            let row_count = self.count_table_rows(table_name).await?;
            tables.push(TableSummary {
                table_name: table_name.to_string(),
                row_count,
            });
        }

        Ok(ListTablesReport {
            success: true,
            table_count: tables.len(),
            tables,
        })
    }

    /// Reports column name/type pairs, the first 5 rows, and the total row
    /// count for `table_name`. The three reads are separate engine calls and
    /// are not snapshot-consistent under concurrent writers.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the table does not exist, or
    /// `Database` if the reads fail.
    pub async fn describe_table(&self, table_name: &str) -> ControlResult<DescribeTableReport> {
        self.ensure_table_exists(table_name).await?;
        let quoted = quote_identifier(table_name);

        let schema = self
            .engine()
            .query_rows(&format!("DESCRIBE {quoted}"))
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        let sample = self
            .engine()
            .query_rows(&format!("SELECT * FROM {quoted} LIMIT {SAMPLE_ROWS}"))
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        let row_count = self.count_table_rows(table_name).await?;

        Ok(DescribeTableReport {
            success: true,
            table_name: table_name.to_string(),
            row_count,
            schema: schema.rows,
            sample_data: sample.rows,
        })
    }

    /// Reports per-column summary statistics via DuckDB's SUMMARIZE.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the table does not exist, or
    /// `Database` if summarization fails.
    pub async fn get_table_stats(&self, table_name: &str) -> ControlResult<TableStatsReport> {
        self.ensure_table_exists(table_name).await?;
        let output = self
            .engine()
            .query_rows(&format!("SUMMARIZE {}", quote_identifier(table_name)))
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;

        Ok(TableStatsReport {
            success: true,
            table_name: table_name.to_string(),
            statistics: output.rows,
        })
    }

    /// Builds the `table://{table_name}` resource payload: schema, up to 10
    /// sample rows, and the row count.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the table does not exist, or
    /// `Database` if the reads fail.
    pub async fn table_resource(&self, table_name: &str) -> ControlResult<TableResource> {
        self.ensure_table_exists(table_name).await?;
        let quoted = quote_identifier(table_name);

        let schema = self
            .engine()
            .query_rows(&format!("DESCRIBE {quoted}"))
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        let sample = self
            .engine()
            .query_rows(&format!(
                "SELECT * FROM {quoted} LIMIT {RESOURCE_SAMPLE_ROWS}"
            ))
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        let row_count = self.count_table_rows(table_name).await?;

        Ok(TableResource {
            table_name: table_name.to_string(),
            schema: schema.rows,
            sample_data: sample.rows,
            row_count,
        })
    }

    async fn ensure_table_exists(&self, table_name: &str) -> ControlResult<()> {
        validate_identifier(table_name)?;
        let exists = self
            .engine()
            .table_exists(table_name)
            .await
            .map_err(|err| map_engine(err, ControlError::Database))?;
        if exists {
            Ok(())
        } else {
            Err(ControlError::NotFound(table_name.to_string()))
        }
    }
}
