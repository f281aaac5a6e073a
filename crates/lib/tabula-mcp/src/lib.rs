//! MCP server implementation for tabula-mcp.
//!
//! This crate wires the tabular control plane into rmcp tool handlers and
//! exposes imported tables as readable `table://` resources.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{
    AnnotateAble,
    CallToolResult,
    Content,
    ErrorCode,
    ListResourcesResult,
    PaginatedRequestParams,
    RawResource,
    ReadResourceRequestParams,
    ReadResourceResult,
    ResourceContents,
    ServerCapabilities,
    ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use serde::{Deserialize, Serialize};
use tabula_core::TabulaControlPlane;

const SERVER_INSTRUCTIONS: &str = r"tabula-mcp provides MCP tools for importing CSV data into DuckDB and analyzing it with SQL.

Workflow:
1. Import data with `import_csv` (direct CSV URLs, Google Sheets sharing URLs, or local file paths). Re-importing under the same table name replaces the table.
2. Explore the catalog: `list_tables`, `describe_table`, `get_table_stats`.
3. Analyze with `query_data` using DuckDB SQL (joins, aggregates, window functions, CTEs). Results are capped at `limit` rows (default 100) unless the query carries its own LIMIT clause.
4. Persist results with `export_query_results`, which writes the full, uncapped result set to a CSV file.

Notes:
- The database connection is created lazily on first use. With a MOTHERDUCK_TOKEN the server attaches to MotherDuck; otherwise data lives in an in-memory database for the process lifetime.
- Every imported table is readable as a `table://{table_name}` resource carrying schema, up to 10 sample rows, and the row count as JSON.
- `reset_connection` discards the current connection; use it if the remote handle goes dead. The next operation reconnects.
- `health` returns `ok`.";

const TABLE_RESOURCE_SCHEME: &str = "table://";

/// Result of a `reset_connection` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConnectionReport {
    pub success: bool,
    pub dropped_live_connection: bool,
    pub message: String,
}

/// MCP server wrapper around the control plane and tool routers.
#[derive(Clone)]
pub struct TabulaMcp {
    tool_router: ToolRouter<Self>,
    control: Arc<TabulaControlPlane>,
}

impl TabulaMcp {
    /// Creates a new server using a control plane by value.
    #[must_use]
    pub fn new(control: TabulaControlPlane) -> Self {
        Self::with_control(Arc::new(control))
    }

    /// Creates a new server using a shared control plane handle.
    #[must_use]
    pub fn with_control(control: Arc<TabulaControlPlane>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_ingest()
            + Self::tool_router_data()
            + Self::tool_router_metadata();
        Self {
            tool_router,
            control,
        }
    }

    pub(crate) fn control(&self) -> &TabulaControlPlane {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl TabulaMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[tool(
        description = "Discard the current database connection. The next operation reconnects from scratch; in local mode this drops all in-memory tables."
    )]
    async fn reset_connection(&self) -> Result<CallToolResult, ErrorData> {
        let dropped = self.control.reset_connection().await;
        let mode = self.control.mode();
        let report = ResetConnectionReport {
            success: true,
            dropped_live_connection: dropped,
            message: format!("connection reset; next operation reconnects in {mode} mode"),
        };
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}

#[tool_handler]
impl ServerHandler for TabulaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let report = self
            .control
            .list_tables()
            .await
            .map_err(helpers::map_err)?;
        let resources = report
            .tables
            .into_iter()
            .map(|table| {
                let mut raw = RawResource::new(
                    format!("{TABLE_RESOURCE_SCHEME}{}", table.table_name),
                    table.table_name.clone(),
                );
                raw.description = Some(format!(
                    "Schema, sample rows, and row count for table '{}'",
                    table.table_name
                ));
                raw.mime_type = Some("application/json".to_string());
                raw.no_annotation()
            })
            .collect();
        Ok(ListResourcesResult {
            meta: None,
            resources,
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let Some(table_name) = request.uri.strip_prefix(TABLE_RESOURCE_SCHEME) else {
            return Err(helpers::mcp_err(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("unknown resource uri: {}", request.uri),
            ));
        };
        let resource = self
            .control
            .table_resource(table_name)
            .await
            .map_err(helpers::map_err)?;
        let text = serde_json::to_string_pretty(&resource)
            .map_err(|err| helpers::mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string()))?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}
