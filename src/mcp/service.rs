//! MCP service implementation using rmcp.
//!
//! This module defines the SchemaReportService struct with the schema tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//! Credentials travel with every call; the service itself is stateless.

use crate::config::PoolOptions;
use crate::error::DbError;
use crate::tools::inspect::{
    InspectToolHandler, ListDatabasesInput, ListDatabasesOutput, QueryInput, QueryOutput,
    ReflectDatabaseInput, ReflectDatabaseOutput,
};
use crate::tools::report::{SchemaReportInput, SchemaReportOutput};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct SchemaReportService {
    /// Pool settings applied to every per-call engine
    pool_options: PoolOptions,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl SchemaReportService {
    pub fn new(pool_options: PoolOptions) -> Self {
        Self {
            pool_options,
            tool_router: Self::tool_router(),
        }
    }

    fn handler(&self) -> InspectToolHandler {
        InspectToolHandler::new(self.pool_options.clone())
    }
}

#[tool_router]
impl SchemaReportService {
    #[tool(
        description = "Produce a fixed-width report of tables, columns and foreign-key relationships.\n`database` may be one name, a list of names, or omitted to report every database on the server.\nDatabases that fail to reflect or have no tables are left out; `diagnostics` says why."
    )]
    async fn schema_report(
        &self,
        Parameters(input): Parameters<SchemaReportInput>,
    ) -> Result<Json<SchemaReportOutput>, McpError> {
        self.handler()
            .schema_report(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }

    #[tool(
        description = "List every database on the server.\nAn empty list with diagnostics means the server could not be queried."
    )]
    async fn list_databases(
        &self,
        Parameters(input): Parameters<ListDatabasesInput>,
    ) -> Result<Json<ListDatabasesOutput>, McpError> {
        self.handler()
            .list_databases(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }

    #[tool(
        description = "Reflect one database: base tables, their columns in order, and outgoing foreign keys.\nTable order follows the catalog and is not sorted."
    )]
    async fn reflect_database(
        &self,
        Parameters(input): Parameters<ReflectDatabaseInput>,
    ) -> Result<Json<ReflectDatabaseOutput>, McpError> {
        self.handler()
            .reflect_database(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }

    #[tool(
        description = "Run a read-only SQL statement (SELECT, SHOW, DESCRIBE, EXPLAIN) in its own transaction.\nReference parameters as :name and pass values in `params`."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<QueryOutput>, McpError> {
        self.handler()
            .query(input)
            .await
            .map(Json)
            .map_err(|e: DbError| e.into())
    }
}

#[tool_handler]
impl ServerHandler for SchemaReportService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "schema-report".to_owned(),
                title: Some("Schema Report".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Schema reporting for MySQL, PostgreSQL and Oracle servers.\n\
                \n\
                Every tool takes `dialect` (mysql, postgresql or oracle), `username`,\n\
                `password`, `host` and `port`. Nothing is stored between calls.\n\
                \n\
                - `schema_report`: human-readable table/column/relationship report\n\
                - `list_databases`: database names on the server\n\
                - `reflect_database`: structured tables for one database\n\
                - `query`: read-only SQL with :name parameters\n\
                \n\
                For Oracle the database is a service name and reflection covers\n\
                the connecting user's own tables."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_info() {
        let service = SchemaReportService::new(PoolOptions::default());
        let info = service.get_info();
        assert_eq!(info.server_info.name, "schema-report");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_tools_registered() {
        let service = SchemaReportService::new(PoolOptions::default());
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            ["list_databases", "query", "reflect_database", "schema_report"]
        );
    }
}
