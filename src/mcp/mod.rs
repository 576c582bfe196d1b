//! MCP server integration module.
//!
//! Exposes the schema tools to agent callers over the rmcp framework.

pub mod service;

pub use service::SchemaReportService;
