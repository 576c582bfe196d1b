//! Transport layer for the MCP server.
//!
//! Only stdio is provided: the server is launched as a child process by the
//! agent that calls it.

pub mod stdio;

pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;

/// Trait for MCP transport implementations.
pub trait Transport: Send + Sync {
    /// Start the transport and handle requests until shut down.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}
