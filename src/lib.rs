//! Schema Report Library
//!
//! Reflects the tables, columns and foreign keys of MySQL and PostgreSQL
//! databases and renders them as a fixed-width text report. The report is
//! available from the command line and as an MCP tool.

pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::SchemaReportService;
pub use tools::SchemaReportHandler;
