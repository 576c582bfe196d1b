//! Tool implementations.
//!
//! This module contains the report pipeline and the MCP tool handlers:
//! - `format`: fixed-width schema report rendering
//! - `report`: orchestration over a `SchemaSource` (`schema_report`)
//! - `inspect`: `list_databases`, `reflect_database` and `query`
//! - `sql_validator`: read-only enforcement for caller-supplied SQL

pub mod format;
pub mod inspect;
pub mod report;
pub mod sql_validator;

pub use format::{ReportScope, render_all, render_one};
pub use inspect::{
    InspectToolHandler, ListDatabasesInput, ListDatabasesOutput, QueryInput, QueryOutput,
    ReflectDatabaseInput, ReflectDatabaseOutput,
};
pub use report::{ConnectionInput, SchemaReportHandler, SchemaReportInput, SchemaReportOutput};
