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

/// Parameters for importing a CSV source into a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ImportCsvParams {
    /// CSV file URL, Google Sheets sharing URL, or local file path.
    pub source: String,
    /// Name for the table; created or fully replaced.
    pub table_name: String,
}

#[tool_router(router = tool_router_ingest, vis = "pub")]
impl TabulaMcp {
    #[tool(
        description = "Import CSV data into a database table. Accepts direct CSV URLs (http/https), Google Sheets sharing URLs (converted to CSV export automatically), and local file paths. Replaces any existing table of the same name."
    )]
    async fn import_csv(
        &self,
        Parameters(params): Parameters<ImportCsvParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .import_csv(&params.source, &params.table_name)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}
