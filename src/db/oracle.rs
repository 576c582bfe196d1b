//! Oracle engine.
//!
//! The `oracle` crate is synchronous, so an engine wraps one connection and
//! runs every operation on tokio's blocking pool. Operations on the same
//! engine are serialized by the connection mutex.

use crate::error::{DbError, DbResult};
use oracle::Connection;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// One Oracle connection, shared by clones of the engine.
#[derive(Clone)]
pub struct OracleEngine {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl std::fmt::Debug for OracleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleEngine")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl OracleEngine {
    /// Connect with an Easy Connect string (`//host:port[/service]`).
    ///
    /// `timeout` bounds the wait; a connect attempt that outlives it is left to
    /// finish on the blocking pool and then dropped.
    pub async fn connect(
        username: String,
        password: String,
        connect_string: String,
        timeout: Duration,
    ) -> DbResult<Self> {
        let attempt = tokio::task::spawn_blocking(move || {
            Connection::connect(&username, &password, &connect_string)
        });

        let conn = match tokio::time::timeout(timeout, attempt).await {
            Err(_) => {
                return Err(DbError::connection(
                    "Timed out connecting to Oracle",
                    "Check that the server is reachable or raise --acquire-timeout",
                ));
            }
            Ok(Err(e)) => return Err(DbError::internal(format!("Oracle connect task failed: {e}"))),
            Ok(Ok(Err(e))) => {
                let message = e.to_string();
                return Err(DbError::connection(
                    format!("Failed to connect to Oracle: {}", message),
                    connection_suggestion(&message),
                ));
            }
            Ok(Ok(Ok(conn))) => conn,
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(conn) => op(conn),
                None => Err(DbError::connection(
                    "Oracle engine is closed",
                    "Open a new engine for this database",
                )),
            }
        })
        .await
        .map_err(|e| DbError::internal(format!("Oracle worker failed: {e}")))?
    }

    /// Close the connection. Later calls are no-ops.
    pub async fn close(&self) {
        let conn = Arc::clone(&self.conn);
        let closed = tokio::task::spawn_blocking(move || {
            let taken = conn.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(Err(e)) = taken.map(|conn| conn.close()) {
                warn!(error = %e, "Failed to close Oracle connection");
            }
        })
        .await;
        if let Err(e) = closed {
            warn!(error = %e, "Oracle close task failed");
        }
        debug!("Oracle connection released");
    }

    pub fn is_closed(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

fn connection_suggestion(message: &str) -> &'static str {
    if message.starts_with("DPI-1047") || message.contains("Oracle Client library") {
        return "Install Oracle Instant Client and add it to the library path";
    }
    if message.contains("ORA-01017") {
        return "Verify the username and password";
    }
    if message.contains("ORA-12514") || message.contains("ORA-12505") {
        return "Check that the service name exists on the listener";
    }
    if message.contains("ORA-12541") || message.contains("ORA-12545") {
        return "Check that the Oracle listener is running and accessible";
    }
    "Verify that Oracle is reachable on the configured host and port"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_suggestions() {
        assert!(
            connection_suggestion("DPI-1047: Cannot locate a 64-bit Oracle Client library")
                .contains("Instant Client")
        );
        assert!(
            connection_suggestion("ORA-01017: invalid username/password; logon denied")
                .contains("password")
        );
        assert!(
            connection_suggestion("ORA-12541: TNS:no listener").contains("listener is running")
        );
        assert!(connection_suggestion("something else").contains("reachable"));
    }

    #[tokio::test]
    async fn test_refused_connect_is_connection_error() {
        // Either the client library is missing or nothing listens on port 1
        let err = OracleEngine::connect(
            "scott".into(),
            "tiger".into(),
            "//127.0.0.1:1/XE".into(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }), "{err:?}");
        assert!(err.to_string().contains("Oracle"));
    }
}
