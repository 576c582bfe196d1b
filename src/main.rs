//! Schema Report - Main entry point.
//!
//! Report mode prints the schema report for the given credentials and exits.
//! Serve mode exposes the same report as an MCP tool over stdio.

use schema_report::config::{Config, RunMode};
use schema_report::diagnostics::default_sink;
use schema_report::tools::SchemaReportHandler;
use schema_report::transport::{StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr: stdout carries the report or the MCP stream.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        mode = %config.mode,
        "Starting schema-report v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool_options = config.pool_options()?;

    match config.mode {
        RunMode::Report => {
            let descriptor = config.descriptor()?;
            info!(url = %descriptor.build_url(true, None), "Generating schema report");

            let handler = SchemaReportHandler::connect(descriptor, pool_options, default_sink());
            println!("{}", handler.generate().await);
        }
        RunMode::Serve => {
            let transport = StdioTransport::new(pool_options);
            info!(transport = transport.name(), "Serving MCP tools");
            if let Err(e) = transport.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Server shutdown complete");
        }
    }

    Ok(())
}
