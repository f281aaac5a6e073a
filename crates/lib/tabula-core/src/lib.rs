//! Core engine and control plane for tabula-mcp.
//!
//! `engine` wraps the lazily-created DuckDB connection; `control` layers the
//! tabular operations (import, query, catalog, export) on top of it.

pub mod control;
pub mod engine;

pub use control::{ControlError, ControlResult, TabulaControlPlane};
pub use engine::{DuckDbEngine, EngineConfig, EngineError, EngineMode};
