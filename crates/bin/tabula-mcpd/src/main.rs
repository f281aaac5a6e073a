//! Daemon entry point for the tabula MCP server.
//!
//! Loads configuration from the environment, builds the shared control plane
//! over a lazily-connected DuckDB engine, and serves the MCP protocol over
//! stdio or streamable HTTP.

mod config;

use std::sync::Arc;

use tabula_core::{DuckDbEngine, EngineConfig, TabulaControlPlane};
use tabula_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::TabulaConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = TabulaConfig::from_args()?;
    let engine = DuckDbEngine::new(EngineConfig {
        motherduck_token: config.motherduck_token.clone(),
    });
    info!("engine configured in {} mode", engine.mode());
    let control = Arc::new(TabulaControlPlane::new(engine));

    if config.http_serve {
        info!("serving MCP over streamable HTTP on {}", config.mcp_http_addr);
        serve_streamable_http(control, McpHttpServerConfig::new(config.mcp_http_addr)).await?;
    } else {
        serve_stdio(control).await?;
    }
    Ok(())
}
