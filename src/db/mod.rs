//! Database access layer.
//!
//! This module provides database access functionality:
//! - Engine management (one short-lived pool per call)
//! - Oracle connections on the blocking pool
//! - Query execution inside a transaction
//! - Named parameter binding
//! - Schema introspection
//! - Row decoding

pub mod engine;
pub mod executor;
pub mod oracle;
pub mod params;
pub mod schema;
pub mod types;

pub use engine::{DbPool, EngineHandle, EngineManager};
pub use executor::QueryExecutor;
pub use oracle::OracleEngine;
pub use schema::{SchemaInspector, SchemaSource};
