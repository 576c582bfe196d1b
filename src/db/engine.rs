//! Engine management.
//!
//! An engine is a small sqlx pool, or a single Oracle connection, bound to one
//! database (or the server root).
//! Engines are opened per call and closed before the call returns, so a
//! multi-database run never accumulates connections.
//!
//! Every pooled connection is pinged before it is handed out
//! (`test_before_acquire`) and statement logging is disabled so user SQL is
//! never echoed to the logs.

use crate::config::PoolOptions;
use crate::db::oracle::OracleEngine;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionDescriptor, Dialect};
use sqlx::{
    ConnectOptions, MySqlPool, PgPool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    postgres::PgConnectOptions, postgres::PgPoolOptions,
};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dialect-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Oracle(OracleEngine),
}

impl DbPool {
    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::Oracle(engine) => engine.close().await,
        }
    }

    /// Get the dialect served by this pool.
    pub fn dialect(&self) -> Dialect {
        match self {
            DbPool::MySql(_) => Dialect::MySql,
            DbPool::Postgres(_) => Dialect::PostgreSql,
            DbPool::Oracle(_) => Dialect::Oracle,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            DbPool::MySql(pool) => pool.is_closed(),
            DbPool::Postgres(pool) => pool.is_closed(),
            DbPool::Oracle(engine) => engine.is_closed(),
        }
    }
}

/// Opens engines for one [`ConnectionDescriptor`].
#[derive(Debug, Clone)]
pub struct EngineManager {
    descriptor: Arc<ConnectionDescriptor>,
    pool_options: PoolOptions,
}

impl EngineManager {
    pub fn new(descriptor: Arc<ConnectionDescriptor>, pool_options: PoolOptions) -> Self {
        Self {
            descriptor,
            pool_options,
        }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Open an engine for `database`, or for the server root when `None` or empty.
    ///
    /// The returned handle must be closed with [`EngineHandle::close`]; prefer
    /// [`EngineManager::with_engine`], which does that on every path.
    pub async fn acquire_engine(&self, database: Option<&str>) -> DbResult<EngineHandle> {
        let database = database.filter(|db| !db.is_empty());
        debug!(
            url = %self.descriptor.build_url(true, database),
            "Opening engine"
        );

        let url = self.descriptor.driver_url(database)?;
        let pool = self.create_pool(&url).await?;

        Ok(EngineHandle {
            pool,
            database: database.map(String::from),
            closed: false,
        })
    }

    /// Run `op` against a freshly opened engine and close it afterwards,
    /// whether `op` succeeded or not.
    pub async fn with_engine<T, F, Fut>(&self, database: Option<&str>, op: F) -> DbResult<T>
    where
        F: FnOnce(DbPool) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let engine = self.acquire_engine(database).await?;
        let result = op(engine.pool().clone()).await;
        engine.close().await;
        result
    }

    async fn create_pool(&self, url: &str) -> DbResult<DbPool> {
        let opts = &self.pool_options;
        let dialect = self.descriptor.dialect();

        match dialect {
            Dialect::MySql => {
                let options = MySqlConnectOptions::from_str(url)
                    .map_err(|e| {
                        DbError::connection(
                            format!("Invalid MySQL connection options: {}", e),
                            "Check the host, port and credentials",
                        )
                    })?
                    .charset("utf8mb4")
                    .disable_statement_logging();

                let pool = MySqlPoolOptions::new()
                    .min_connections(0)
                    .max_connections(opts.max_connections_or_default())
                    .acquire_timeout(opts.acquire_timeout_or_default())
                    .idle_timeout(Some(opts.idle_timeout_or_default()))
                    .test_before_acquire(true)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(
                            format!("Failed to connect: {}", e),
                            connection_suggestion(dialect, &e),
                        )
                    })?;
                Ok(DbPool::MySql(pool))
            }
            Dialect::PostgreSql => {
                let options = PgConnectOptions::from_str(url)
                    .map_err(|e| {
                        DbError::connection(
                            format!("Invalid PostgreSQL connection options: {}", e),
                            "Check the host, port and credentials",
                        )
                    })?
                    .disable_statement_logging();

                let pool = PgPoolOptions::new()
                    .min_connections(0)
                    .max_connections(opts.max_connections_or_default())
                    .acquire_timeout(opts.acquire_timeout_or_default())
                    .idle_timeout(Some(opts.idle_timeout_or_default()))
                    .test_before_acquire(true)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(
                            format!("Failed to connect: {}", e),
                            connection_suggestion(dialect, &e),
                        )
                    })?;
                Ok(DbPool::Postgres(pool))
            }
            Dialect::Oracle => {
                let engine = OracleEngine::connect(
                    self.descriptor.username().to_string(),
                    self.descriptor.password().to_string(),
                    url.to_string(),
                    opts.acquire_timeout_or_default(),
                )
                .await?;
                Ok(DbPool::Oracle(engine))
            }
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(dialect: Dialect, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!("Check that the {} server is running and accessible", dialect);
    }

    if error_str.contains("authentication")
        || error_str.contains("password")
        || error_str.contains("access denied")
    {
        return "Verify the username and password".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unknown database") {
        return "Check that the database name exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    format!(
        "Verify that {} is reachable on the configured host and port",
        dialect
    )
}

/// An open engine bound to one database.
///
/// Closing is explicit via [`EngineHandle::close`]. If a handle is dropped
/// without being closed (early return or panic), `Drop` spawns the close on
/// the current tokio runtime.
pub struct EngineHandle {
    pool: DbPool,
    database: Option<String>,
    closed: bool,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("dialect", &self.pool.dialect())
            .field("database", &self.database)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Database this engine is bound to; `None` for the server root.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Close every connection of this engine.
    pub async fn close(mut self) {
        self.closed = true;
        self.pool.close().await;
        debug!(database = ?self.database, "Engine closed");
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let pool = self.pool.clone();
        let database = self.database.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    pool.close().await;
                    warn!(
                        database = ?database,
                        "Engine closed via Drop - consider using explicit close()"
                    );
                });
            }
            Err(_) => warn!(
                database = ?database,
                "Engine dropped outside a runtime; connections close when the pool is freed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionDescriptor;
    use std::time::Duration;

    fn manager(dialect: &str, port: u16) -> EngineManager {
        let descriptor = ConnectionDescriptor::new("root", "pw", "127.0.0.1", port, dialect, "")
            .unwrap();
        let options = PoolOptions {
            acquire_timeout_secs: Some(2),
            ..Default::default()
        };
        EngineManager::new(Arc::new(descriptor), options)
    }

    #[tokio::test]
    async fn test_oracle_refused_is_connection_error() {
        let err = manager("oracle", 1).acquire_engine(Some("XE")).await.unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }), "{err:?}");
        assert!(err.to_string().contains("Oracle"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Port 1 is reserved (tcpmux) and closed on test hosts.
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            manager("postgresql", 1).acquire_engine(Some("world")),
        )
        .await
        .expect("connect attempt should not hang");
        assert!(matches!(result, Err(DbError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_with_engine_skips_op_when_acquire_fails() {
        let mut ran = false;
        let result: DbResult<()> = manager("mysql", 1)
            .with_engine(Some("world"), |_pool| {
                ran = true;
                async { Ok(()) }
            })
            .await;
        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    fn test_connection_suggestion_refused() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        let suggestion = connection_suggestion(Dialect::MySql, &err);
        assert!(suggestion.contains("MySQL server is running"));
    }
}
