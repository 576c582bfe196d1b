//! Schema report tool.
//!
//! This module implements the `schema_report` MCP tool and the CLI's report
//! mode. Both drive [`SchemaReportHandler::generate`]:
//!
//! 1. Named databases: reflect each, skip failures and empty databases,
//!    render the rest.
//! 2. No names: list the server's databases first, then proceed as above.

use crate::config::PoolOptions;
use crate::db::{EngineManager, SchemaInspector, SchemaSource};
use crate::diagnostics::DiagnosticSink;
use crate::error::DbResult;
use crate::models::{ConnectionDescriptor, DatabaseSelection, PASSWORD_MASK, TableMetadata};
use crate::tools::format::{NO_DATABASES, ReportScope, render_all};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

fn default_host() -> String {
    crate::config::DEFAULT_HOST.to_string()
}

/// Credentials and server address, supplied on every tool call.
#[derive(Clone, Deserialize, JsonSchema)]
pub struct ConnectionInput {
    /// SQL dialect: "mysql", "postgresql" or "oracle"
    pub dialect: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Server host. Default: 127.0.0.1
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port. Default: the dialect's standard port
    #[serde(default)]
    pub port: Option<u16>,
}

impl std::fmt::Debug for ConnectionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInput")
            .field("dialect", &self.dialect)
            .field("username", &self.username)
            .field("password", &PASSWORD_MASK)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl ConnectionInput {
    /// Build a descriptor targeting `databases`.
    ///
    /// `databases` may be absent, JSON `null`, a string or an array of strings.
    pub fn descriptor(&self, databases: Option<JsonValue>) -> DbResult<ConnectionDescriptor> {
        let selection = DatabaseSelection::try_from(databases.unwrap_or(JsonValue::Null))?;
        let port = match self.port {
            Some(port) => port,
            None => self.dialect.parse::<crate::models::Dialect>()?.default_port(),
        };
        ConnectionDescriptor::new(
            self.username.as_str(),
            self.password.as_str(),
            self.host.as_str(),
            port,
            &self.dialect,
            selection,
        )
    }
}

/// Input for the schema_report tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SchemaReportInput {
    #[serde(flatten)]
    pub connection: ConnectionInput,
    /// A database name, a list of names, or omitted to report every database
    /// on the server
    #[serde(default)]
    pub database: Option<JsonValue>,
}

/// Output from the schema_report tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SchemaReportOutput {
    /// Fixed-width text report
    pub report: String,
    /// Databases left out of the report, and why
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Produces the combined report for one descriptor's databases.
#[derive(Debug)]
pub struct SchemaReportHandler<S> {
    source: S,
    targets: Vec<String>,
}

impl SchemaReportHandler<SchemaInspector> {
    /// Handler backed by a live server.
    pub fn connect(
        descriptor: ConnectionDescriptor,
        pool_options: PoolOptions,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let targets = descriptor.target_databases().to_vec();
        let engines = EngineManager::new(Arc::new(descriptor), pool_options);
        Self::new(SchemaInspector::new(engines, sink), targets)
    }
}

impl<S: SchemaSource> SchemaReportHandler<S> {
    /// `targets` empty means "every database the source lists".
    pub fn new(source: S, targets: Vec<String>) -> Self {
        Self { source, targets }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Build the combined report.
    ///
    /// Never fails: databases that cannot be reflected are left out, and the
    /// sink has already been told why.
    pub async fn generate(&self) -> String {
        if !self.targets.is_empty() {
            let entries = self.reflect_each(&self.targets).await;
            return render_all(&entries, ReportScope::Specified);
        }

        let databases = self.source.list_all_databases().await;
        if databases.is_empty() {
            return NO_DATABASES.to_string();
        }
        let entries = self.reflect_each(&databases).await;
        render_all(&entries, ReportScope::Discovered)
    }

    /// Reflect databases one at a time, in order, keeping those with tables.
    async fn reflect_each(&self, databases: &[String]) -> Vec<(String, Vec<TableMetadata>)> {
        let mut entries = Vec::with_capacity(databases.len());
        for database in databases {
            match self.source.reflect(Some(database.as_str())).await {
                Some(tables) if !tables.is_empty() => {
                    info!(database = %database, tables = tables.len(), "Reflected");
                    entries.push((database.clone(), tables));
                }
                Some(_) => info!(database = %database, "No tables; skipped"),
                None => info!(database = %database, "Reflection failed; skipped"),
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;

    fn connection(dialect: &str) -> ConnectionInput {
        serde_json::from_value(json!({
            "dialect": dialect,
            "username": "root",
            "password": "s3cret"
        }))
        .unwrap()
    }

    #[test]
    fn test_connection_input_defaults() {
        let input = connection("postgresql");
        assert_eq!(input.host, "127.0.0.1");
        let descriptor = input.descriptor(None).unwrap();
        assert_eq!(descriptor.port(), 5432);
        assert!(descriptor.target_databases().is_empty());
    }

    #[test]
    fn test_connection_input_database_shapes() {
        let input = connection("mysql");
        let one = input.descriptor(Some(json!("world"))).unwrap();
        assert_eq!(one.target_databases(), ["world"]);

        let many = input.descriptor(Some(json!(["world", "employees"]))).unwrap();
        assert_eq!(many.target_databases(), ["world", "employees"]);

        let err = input.descriptor(Some(json!(42))).unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));
    }

    #[test]
    fn test_connection_input_unknown_dialect() {
        let err = connection("sqlite").descriptor(None).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedDialect { .. }));
    }

    #[test]
    fn test_connection_input_debug_masks_password() {
        let rendered = format!("{:?}", connection("mysql"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains(PASSWORD_MASK));
    }

    #[test]
    fn test_schema_report_input_flattened() {
        let input: SchemaReportInput = serde_json::from_value(json!({
            "dialect": "mysql",
            "username": "root",
            "port": 3307,
            "database": ["world"]
        }))
        .unwrap();
        assert_eq!(input.connection.port, Some(3307));
        assert_eq!(input.database, Some(json!(["world"])));
    }
}
