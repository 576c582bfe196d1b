//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::config::PoolOptions;
use crate::error::{DbError, DbResult};
use crate::mcp::SchemaReportService;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use tokio::signal;
use tracing::{info, warn};

/// Reads JSON-RPC messages from stdin and writes responses to stdout.
pub struct StdioTransport {
    pool_options: PoolOptions,
}

impl StdioTransport {
    /// `pool_options` applies to the engines each tool call creates.
    pub fn new(pool_options: PoolOptions) -> Self {
        Self { pool_options }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = SchemaReportService::new(self.pool_options.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });

            // Engines are per call, so nothing is left to close. stdin may
            // still be blocked in a read that select! cannot interrupt.
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for SIGINT or SIGTERM.
///
/// A handler that cannot be installed never fires.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_transport_creation() {
        let transport = StdioTransport::new(PoolOptions::default());
        assert_eq!(transport.name(), "stdio");
    }
}
