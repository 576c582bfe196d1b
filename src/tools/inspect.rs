//! Per-call tool handlers.
//!
//! This module implements the `schema_report`, `list_databases`,
//! `reflect_database` and `query` MCP tools. Every call builds its own
//! descriptor from the supplied credentials; nothing is kept between calls.
//!
//! Diagnostics raised during a call are collected, forwarded to the log and
//! returned to the caller alongside the result.

use crate::config::PoolOptions;
use crate::db::{EngineManager, SchemaInspector};
use crate::diagnostics::{MemorySink, TracingSink};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionDescriptor, QueryParams, TableMetadata};
use crate::tools::report::{ConnectionInput, SchemaReportHandler, SchemaReportInput, SchemaReportOutput};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for the list_databases tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDatabasesInput {
    #[serde(flatten)]
    pub connection: ConnectionInput,
}

/// Output for the list_databases tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    pub count: usize,
    /// Why the list may be empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Input for the reflect_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReflectDatabaseInput {
    #[serde(flatten)]
    pub connection: ConnectionInput,
    /// Database to reflect. Omit for the server's default database.
    #[serde(default)]
    pub database: Option<String>,
}

/// Output from the reflect_database tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReflectDatabaseOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Tables in catalog order
    pub tables: Vec<TableMetadata>,
    pub count: usize,
    /// False when reflection failed; see diagnostics
    pub reflected: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    #[serde(flatten)]
    pub connection: ConnectionInput,
    /// Read-only SQL. Reference parameters as :name.
    pub sql: String,
    /// Database to run against. Omit for the server root.
    #[serde(default)]
    pub database: Option<String>,
    /// Named parameter values, e.g. {"id": 7}
    #[serde(default)]
    pub params: QueryParams,
}

/// Output from the query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

pub struct InspectToolHandler {
    pool_options: PoolOptions,
}

impl InspectToolHandler {
    pub fn new(pool_options: PoolOptions) -> Self {
        Self { pool_options }
    }

    fn inspector(&self, descriptor: ConnectionDescriptor, sink: &MemorySink) -> SchemaInspector {
        let engines = EngineManager::new(Arc::new(descriptor), self.pool_options.clone());
        SchemaInspector::new(engines, Arc::new(sink.clone()))
    }

    /// Handle the schema_report tool call.
    pub async fn schema_report(&self, input: SchemaReportInput) -> DbResult<SchemaReportOutput> {
        let descriptor = input.connection.descriptor(input.database)?;
        info!(url = %descriptor.build_url(true, None), "Generating schema report");

        let sink = MemorySink::new();
        let handler =
            SchemaReportHandler::connect(descriptor, self.pool_options.clone(), Arc::new(sink.clone()));
        let report = handler.generate().await;

        Ok(SchemaReportOutput {
            report,
            diagnostics: sink.forward_to(&TracingSink),
        })
    }

    /// Handle the list_databases tool call.
    pub async fn list_databases(&self, input: ListDatabasesInput) -> DbResult<ListDatabasesOutput> {
        let descriptor = input.connection.descriptor(None)?;
        let sink = MemorySink::new();
        let databases = self.inspector(descriptor, &sink).list_all_databases().await;

        Ok(ListDatabasesOutput {
            count: databases.len(),
            databases,
            diagnostics: sink.forward_to(&TracingSink),
        })
    }

    /// Handle the reflect_database tool call.
    pub async fn reflect_database(
        &self,
        input: ReflectDatabaseInput,
    ) -> DbResult<ReflectDatabaseOutput> {
        let descriptor = input.connection.descriptor(None)?;
        let sink = MemorySink::new();
        let database = input.database.filter(|db| !db.trim().is_empty());
        let reflected = self
            .inspector(descriptor, &sink)
            .reflect(database.as_deref())
            .await;

        let (tables, reflected) = match reflected {
            Some(tables) => (tables, true),
            None => (Vec::new(), false),
        };
        Ok(ReflectDatabaseOutput {
            database,
            count: tables.len(),
            tables,
            reflected,
            diagnostics: sink.forward_to(&TracingSink),
        })
    }

    /// Handle the query tool call.
    ///
    /// The executor downgrades failures to an absent result; here the
    /// collected diagnostic is turned back into an error for the caller.
    pub async fn query(&self, input: QueryInput) -> DbResult<QueryOutput> {
        let descriptor = input.connection.descriptor(None)?;
        let sink = MemorySink::new();
        let database = input.database.unwrap_or_default();
        let result = self
            .inspector(descriptor, &sink)
            .executor()
            .execute(&input.sql, &database, Some(&input.params))
            .await;
        let diagnostics = sink.forward_to(&TracingSink);

        match result {
            Some(result) => Ok(QueryOutput {
                row_count: result.row_count(),
                columns: result.columns,
                rows: result.rows,
                execution_time_ms: result.execution_time_ms,
            }),
            None => {
                let suggestion = sink
                    .entries()
                    .into_iter()
                    .find_map(|d| d.suggestion)
                    .unwrap_or_else(|| "Check the SQL and the connection settings".to_string());
                Err(DbError::database(diagnostics.join("; "), None, suggestion))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler() -> InspectToolHandler {
        InspectToolHandler::new(PoolOptions {
            acquire_timeout_secs: Some(2),
            ..Default::default()
        })
    }

    fn unreachable(dialect: &str) -> JsonValue {
        json!({ "dialect": dialect, "username": "root", "password": "pw", "port": 1 })
    }

    #[tokio::test]
    async fn test_schema_report_invalid_database_shape() {
        let mut input = unreachable("mysql");
        input["database"] = json!(42);
        let input: SchemaReportInput = serde_json::from_value(input).unwrap();
        let err = handler().schema_report(input).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_schema_report_unreachable_specified() {
        let mut input = unreachable("postgresql");
        input["database"] = json!(["world"]);
        let input: SchemaReportInput = serde_json::from_value(input).unwrap();
        let output = handler().schema_report(input).await.unwrap();
        assert_eq!(output.report, "No metadata found for the specified databases.");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].starts_with("[reflect] world:"));
    }

    #[tokio::test]
    async fn test_list_databases_unreachable() {
        let input: ListDatabasesInput = serde_json::from_value(unreachable("mysql")).unwrap();
        let output = handler().list_databases(input).await.unwrap();
        assert_eq!(output.count, 0);
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_reflect_database_failure_flagged() {
        let mut input = unreachable("postgresql");
        input["database"] = json!("world");
        let input: ReflectDatabaseInput = serde_json::from_value(input).unwrap();
        let output = handler().reflect_database(input).await.unwrap();
        assert!(!output.reflected);
        assert!(output.tables.is_empty());
        assert_eq!(output.database.as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_query_write_is_error() {
        let mut input = unreachable("mysql");
        input["sql"] = json!("DELETE FROM city");
        let input: QueryInput = serde_json::from_value(input).unwrap();
        let err = handler().query(input).await.unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
    }
}
