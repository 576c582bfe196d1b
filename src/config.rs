//! Configuration handling for schema-report.
//!
//! This module provides configuration management via CLI arguments.

use crate::error::{DbError, DbResult};
use crate::models::{ConnectionDescriptor, DatabaseSelection, Dialect};
use clap::{Parser, ValueEnum};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// Pool configuration defaults. Pools live for a single call, so they stay small.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool configuration options.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 2)
    pub max_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
}

impl PoolOptions {
    /// Get max_connections with default value.
    pub fn max_connections_or_default(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Get idle_timeout with default value.
    pub fn idle_timeout_or_default(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    /// Get acquire_timeout with default value.
    pub fn acquire_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.acquire_timeout_secs
                .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        )
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == Some(0) {
            return Err("max_connections must be greater than 0".to_string());
        }
        if self.acquire_timeout_secs == Some(0) {
            return Err("acquire_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// What the binary does once configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RunMode {
    /// Print the schema report for the given credentials and exit
    #[default]
    Report,
    /// Serve the report as an MCP tool over stdio
    Serve,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Serve => write!(f, "serve"),
        }
    }
}

/// Configuration for schema-report.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "schema-report",
    about = "Reflect database schemas and print a table/column/relationship report",
    version,
    author
)]
pub struct Config {
    /// Run mode (report or serve)
    #[arg(short, long, value_enum, default_value = "report")]
    pub mode: RunMode,

    /// SQL dialect: mysql, postgresql or oracle
    #[arg(long)]
    pub dialect: Option<String>,

    /// Database user
    #[arg(short, long)]
    pub username: Option<String>,

    /// Database password
    #[arg(
        short,
        long,
        env = "SCHEMA_REPORT_PASSWORD",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub password: String,

    /// Database server host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Database server port (default: the dialect's standard port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Databases to report on. Can be repeated or comma-separated.
    /// When omitted, every database visible to the user is reported.
    #[arg(short, long = "database", value_name = "NAME", value_delimiter = ',')]
    pub databases: Vec<String>,

    /// Maximum connections per engine
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Seconds to wait for a connection before giving up on a database
    #[arg(long)]
    pub acquire_timeout: Option<u64>,

    /// Seconds an idle pooled connection is kept
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pool options assembled from the individual flags.
    pub fn pool_options(&self) -> DbResult<PoolOptions> {
        let options = PoolOptions {
            max_connections: self.max_connections,
            idle_timeout_secs: self.idle_timeout,
            acquire_timeout_secs: self.acquire_timeout,
        };
        options.validate().map_err(DbError::invalid_argument)?;
        Ok(options)
    }

    /// Build the connection descriptor for report mode.
    pub fn descriptor(&self) -> DbResult<ConnectionDescriptor> {
        let dialect_name = self
            .dialect
            .as_deref()
            .ok_or_else(|| DbError::invalid_argument("--dialect is required in report mode"))?;
        let username = self
            .username
            .as_deref()
            .ok_or_else(|| DbError::invalid_argument("--username is required in report mode"))?;

        let dialect = Dialect::from_str(dialect_name)?;
        let port = self.port.unwrap_or_else(|| dialect.default_port());

        ConnectionDescriptor::new(
            username,
            self.password.as_str(),
            self.host.as_str(),
            port,
            dialect_name,
            DatabaseSelection::list(self.databases.clone()),
        )
    }
}
