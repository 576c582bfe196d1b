//! Error types for schema-report.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Construction-time variants (`InvalidArgument`, `UnsupportedDialect`) are returned to
//! the caller; runtime variants are normally caught at the executor/reflector boundary
//! and forwarded to a [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Unsupported dialect '{dialect}'. Supported dialects: {}", supported.join(", "))]
    UnsupportedDialect {
        dialect: String,
        supported: Vec<&'static str>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Reflection failed for '{database}': {message}")]
    Reflection { database: String, message: String },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unsupported dialect error listing every registered dialect.
    pub fn unsupported_dialect(dialect: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            dialect: dialect.into(),
            supported: crate::models::Dialect::names().to_vec(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a reflection error for one database.
    pub fn reflection(database: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reflection {
            database: database.into(),
            message: message.into(),
        }
    }

    /// Create a permission error.
    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error was raised while validating constructor input.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::UnsupportedDialect { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the host, port and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax, privileges and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a connection",
                "Check that the server is reachable or raise --acquire-timeout",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Convert Oracle client errors to DbError.
///
/// Server errors carry an `ORA-nnnnn` prefix, kept as the SQL state. Client
/// library failures (`DPI-`/`OCI-`) are connection problems.
impl From<oracle::Error> for DbError {
    fn from(err: oracle::Error) -> Self {
        let message = err.to_string();
        let code = oracle_error_code(&message);
        match code {
            Some(code) if code.starts_with("ORA-") => DbError::database(
                message.clone(),
                Some(code.to_string()),
                "Check the SQL syntax, privileges and referenced objects",
            ),
            Some(_) => DbError::connection(
                message.clone(),
                "Check that the Oracle Client libraries are installed and on the library path",
            ),
            None => DbError::internal(format!("Oracle error: {}", message)),
        }
    }
}

/// `ORA-00942`, `DPI-1047`, ... at the start of an Oracle message.
pub(crate) fn oracle_error_code(message: &str) -> Option<&str> {
    let code = message.split(':').next()?.trim();
    let (prefix, digits) = code.split_once('-')?;
    let known = matches!(prefix, "ORA" | "DPI" | "OCI" | "TNS");
    (known && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(code)
}

impl From<std::convert::Infallible> for DbError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for semantic error categorization.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::InvalidArgument { .. }
            | DbError::UnsupportedDialect { .. }
            | DbError::Permission { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), suggestion_data(err.suggestion()))
            }
            DbError::Database {
                message,
                sql_state,
                suggestion,
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, suggestion_data(Some(suggestion)))
            }
            DbError::Connection { suggestion, .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(Some(suggestion)))
            }
            DbError::Reflection { .. } | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_dialect_lists_choices() {
        let err = DbError::unsupported_dialect("sqlite");
        let msg = err.to_string();
        assert!(msg.contains("sqlite"));
        assert!(msg.contains("mysql, postgresql, oracle"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::database(
            "Syntax error",
            Some("42601".to_string()),
            "Check SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check SQL syntax"));
        assert_eq!(DbError::internal("x").suggestion(), None);
    }

    #[test]
    fn test_construction_errors() {
        assert!(DbError::invalid_argument("bad").is_construction_error());
        assert!(DbError::unsupported_dialect("db2").is_construction_error());
        assert!(!DbError::connection("refused", "start it").is_construction_error());
        assert!(!DbError::reflection("world", "denied").is_construction_error());
    }

    #[test]
    fn test_invalid_argument_maps_to_invalid_params() {
        let mcp_err: rmcp::ErrorData = DbError::invalid_argument("bad input").into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_connection_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::connection("failed", "try again").into();
        assert_eq!(mcp_err.code.0, -32603);
        let data = mcp_err.data.unwrap();
        assert_eq!(data["suggestion"], "try again");
    }

    #[test]
    fn test_oracle_error_code() {
        assert_eq!(
            oracle_error_code("ORA-00942: table or view does not exist"),
            Some("ORA-00942")
        );
        assert_eq!(
            oracle_error_code("DPI-1047: Cannot locate a 64-bit Oracle Client library"),
            Some("DPI-1047")
        );
        assert_eq!(oracle_error_code("NULL value found"), None);
        assert_eq!(oracle_error_code("ORA-: nothing"), None);
    }

    #[test]
    fn test_database_error_includes_sql_state() {
        let err = DbError::database("syntax error", Some("42601".to_string()), "check syntax");
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.message.contains("42601"));
    }
}
