//! Data models for schema-report.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionDescriptor, DatabaseSelection, Dialect, PASSWORD_MASK};
pub use query::{QueryParam, QueryParams, QueryResult};
pub use schema::{ForeignKeyRef, TableMetadata};
