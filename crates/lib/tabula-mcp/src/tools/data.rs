use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use tabula_core::control::DEFAULT_QUERY_LIMIT;

use crate::{TabulaMcp, helpers};

/// Parameters for running an analysis query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryDataParams {
    /// SQL query to execute.
    pub query: String,
    /// Maximum number of rows to return (default 100). Ignored when the
    /// query already contains a LIMIT clause.
    pub limit: Option<usize>,
}

/// Parameters for exporting query results to a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExportQueryResultsParams {
    /// SQL query to execute; the full result set is exported.
    pub query: String,
    /// Path of the CSV file to write; overwritten if it exists.
    pub output_path: String,
}

#[tool_router(router = tool_router_data, vis = "pub")]
impl TabulaMcp {
    #[tool(
        description = "Execute a SQL query against the loaded data. Standard DuckDB SQL is available: WHERE, GROUP BY, ORDER BY, JOINs, aggregates, window functions, and CTEs."
    )]
    async fn query_data(
        &self,
        Parameters(params): Parameters<QueryDataParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let limit = params.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let report = self
            .control()
            .query_data(&params.query, limit)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(
        description = "Export query results to a CSV file with a header row. No row limit is applied; the full result set is written."
    )]
    async fn export_query_results(
        &self,
        Parameters(params): Parameters<ExportQueryResultsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .export_query_results(&params.query, &params.output_path)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}
