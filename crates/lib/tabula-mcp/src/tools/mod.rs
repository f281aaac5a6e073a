//! MCP tool modules.
//!
//! Tools are grouped by domain: CSV ingestion, query/export data access, and
//! catalog metadata.

pub mod data;
pub mod ingest;
pub mod metadata;
