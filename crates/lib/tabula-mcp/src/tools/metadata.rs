use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{TabulaMcp, helpers};

/// Parameters for describing a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DescribeTableParams {
    pub table_name: String,
}

/// Parameters for summarizing a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetTableStatsParams {
    pub table_name: String,
}

#[tool_router(router = tool_router_metadata, vis = "pub")]
impl TabulaMcp {
    #[tool(description = "List all tables in the database with their row counts.")]
    async fn list_tables(&self) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .list_tables()
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(
        description = "Describe a table: column names and types, the first 5 rows, and the total row count."
    )]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .describe_table(&params.table_name)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(
        description = "Get per-column summary statistics for a table (min/max, nulls, approximate distinct counts, quartiles) via DuckDB's SUMMARIZE."
    )]
    async fn get_table_stats(
        &self,
        Parameters(params): Parameters<GetTableStatsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .get_table_stats(&params.table_name)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}
