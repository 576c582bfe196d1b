//! Failure paths against a real driver and a closed local port.
//!
//! Nothing listens on port 1, so every connection attempt is refused and the
//! failure must surface as a diagnostic rather than an error.

use schema_report::config::PoolOptions;
use schema_report::db::{EngineManager, QueryExecutor, SchemaInspector};
use schema_report::diagnostics::{MemorySink, Stage};
use schema_report::models::{ConnectionDescriptor, DatabaseSelection, QueryParams};
use schema_report::tools::SchemaReportHandler;
use std::sync::Arc;

fn pool_options() -> PoolOptions {
    PoolOptions {
        acquire_timeout_secs: Some(2),
        ..Default::default()
    }
}

fn descriptor(dialect: &str, databases: &[&str]) -> ConnectionDescriptor {
    let names = databases.iter().map(|n| n.to_string()).collect();
    ConnectionDescriptor::new(
        "root",
        "pw",
        "127.0.0.1",
        1,
        dialect,
        DatabaseSelection::list(names),
    )
    .unwrap()
}

fn inspector(dialect: &str) -> (SchemaInspector, MemorySink) {
    let sink = MemorySink::new();
    let engines = EngineManager::new(Arc::new(descriptor(dialect, &[])), pool_options());
    (SchemaInspector::new(engines, Arc::new(sink.clone())), sink)
}

#[tokio::test]
async fn test_query_failure_is_absent_result() {
    for dialect in ["mysql", "postgresql", "oracle"] {
        let sink = MemorySink::new();
        let engines = EngineManager::new(Arc::new(descriptor(dialect, &[])), pool_options());
        let executor = QueryExecutor::new(engines, Arc::new(sink.clone()));

        let result = executor
            .execute("SELECT 1", "world", Some(&QueryParams::new()))
            .await;

        assert!(result.is_none(), "{dialect}");
        let diagnostics = sink.entries();
        assert_eq!(diagnostics.len(), 1, "{dialect}");
        assert_eq!(diagnostics[0].stage, Stage::Query);
    }
}

#[tokio::test]
async fn test_list_databases_unreachable() {
    let (inspector, sink) = inspector("postgresql");

    assert!(inspector.list_all_databases().await.is_empty());

    let diagnostics = sink.entries();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].stage, Stage::ListDatabases);
    assert!(diagnostics[0].database.is_none());
}

#[tokio::test]
async fn test_reflect_unreachable() {
    let (inspector, sink) = inspector("mysql");

    assert!(inspector.reflect(Some("employees")).await.is_none());

    let diagnostics = sink.entries();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].stage, Stage::Reflect);
    assert_eq!(diagnostics[0].database.as_deref(), Some("employees"));
}

#[tokio::test]
async fn test_report_for_unreachable_named_databases() {
    let sink = MemorySink::new();
    let handler = SchemaReportHandler::connect(
        descriptor("mysql", &["world", "employees"]),
        pool_options(),
        Arc::new(sink.clone()),
    );

    assert_eq!(handler.targets(), ["world", "employees"]);
    assert_eq!(
        handler.generate().await,
        "No metadata found for the specified databases."
    );
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn test_report_for_unreachable_server() {
    let sink = MemorySink::new();
    let handler = SchemaReportHandler::connect(
        descriptor("postgresql", &[]),
        pool_options(),
        Arc::new(sink.clone()),
    );

    assert_eq!(
        handler.generate().await,
        "No databases found or failed to fetch databases."
    );
    assert_eq!(sink.len(), 1);
}
