//! Query execution.
//!
//! Every statement runs inside one transaction on a freshly opened engine:
//! begin, execute, commit. Failures roll back (the transaction is dropped
//! uncommitted), the engine is closed either way, and the error is handed to
//! the diagnostic sink. Callers only ever see `Some(result)` or `None`.
//!
//! # Architecture
//!
//! The executor uses dialect-specific implementations organized in submodules:
//! - `mysql`: MySQL fetch inside a transaction
//! - `postgres`: PostgreSQL fetch inside a transaction
//! - `oracle`: fetch on the blocking pool; the implicit transaction is rolled
//!   back afterwards since nothing was written

use crate::db::engine::{DbPool, EngineManager};
use crate::db::params::{BoundSql, bind_named};
use crate::db::types::RowToJson;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::error::DbResult;
use crate::models::{Dialect, QueryParams, QueryResult};
use crate::tools::sql_validator::validate_readonly;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs SQL against one database of the configured server.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    engines: EngineManager,
    sink: Arc<dyn DiagnosticSink>,
}

impl QueryExecutor {
    pub fn new(engines: EngineManager, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { engines, sink }
    }

    pub fn engines(&self) -> &EngineManager {
        &self.engines
    }

    pub fn dialect(&self) -> Dialect {
        self.engines.descriptor().dialect()
    }

    /// Execute caller-supplied SQL against `database` (empty for the server root).
    ///
    /// The statement must be read-only. Named parameters are referenced as
    /// `:name`. Any failure is reported to the sink and yields `None`.
    pub async fn execute(
        &self,
        sql: &str,
        database: &str,
        params: Option<&QueryParams>,
    ) -> Option<QueryResult> {
        let result = match validate_readonly(sql, self.dialect()) {
            Ok(()) => self.try_run(sql, database, params).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(result) => Some(result),
            Err(e) => {
                self.sink
                    .report(Diagnostic::from_error(Stage::Query, Some(database), &e));
                None
            }
        }
    }

    /// Execute SQL without the read-only parse and without reporting.
    ///
    /// Used for fixed catalog statements such as `SHOW DATABASES;`, which not
    /// every parser dialect understands. The caller owns error reporting.
    pub(crate) async fn try_run(
        &self,
        sql: &str,
        database: &str,
        params: Option<&QueryParams>,
    ) -> DbResult<QueryResult> {
        let dialect = self.dialect();
        let bound = match params {
            Some(params) if !params.is_empty() => bind_named(sql, params, dialect)?,
            _ => BoundSql {
                sql: sql.to_string(),
                params: Vec::new(),
            },
        };

        debug!(
            database = %database,
            params = bound.params.len(),
            "Executing query"
        );

        let bound = &bound;
        self.engines
            .with_engine(Some(database), |pool| async move {
                let start = Instant::now();
                match pool {
                    DbPool::MySql(p) => mysql::fetch_in_transaction(&p, bound, start).await,
                    DbPool::Postgres(p) => postgres::fetch_in_transaction(&p, bound, start).await,
                    DbPool::Oracle(e) => oracle::fetch_in_transaction(&e, bound, start).await,
                }
            })
            .await
    }
}

/// Process rows from any dialect into a QueryResult.
fn process_rows<R: RowToJson>(rows: Vec<R>, start: Instant) -> QueryResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    let Some(first) = rows.first() else {
        return QueryResult::empty(execution_time_ms);
    };

    QueryResult {
        columns: first.column_names(),
        rows: rows.iter().map(RowToJson::to_json_map).collect(),
        execution_time_ms,
    }
}

// =============================================================================
// Dialect-Specific Implementations
// =============================================================================

mod mysql {
    use super::*;
    use crate::db::params::bind_mysql_param;
    use sqlx::MySqlPool;

    pub async fn fetch_in_transaction(
        pool: &MySqlPool,
        bound: &BoundSql,
        start: Instant,
    ) -> DbResult<QueryResult> {
        let mut tx = pool.begin().await?;

        // Without params, use raw SQL: SHOW and friends are not preparable
        let rows = if bound.params.is_empty() {
            use sqlx::Executor;
            (&mut *tx).fetch_all(bound.sql.as_str()).await?
        } else {
            let mut query = sqlx::query(&bound.sql);
            for param in &bound.params {
                query = bind_mysql_param(query, param);
            }
            query.fetch_all(&mut *tx).await?
        };

        tx.commit().await?;
        Ok(process_rows(rows, start))
    }
}

mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_param;
    use sqlx::PgPool;

    pub async fn fetch_in_transaction(
        pool: &PgPool,
        bound: &BoundSql,
        start: Instant,
    ) -> DbResult<QueryResult> {
        let mut tx = pool.begin().await?;

        let rows = if bound.params.is_empty() {
            use sqlx::Executor;
            (&mut *tx).fetch_all(bound.sql.as_str()).await?
        } else {
            let mut query = sqlx::query(&bound.sql);
            for param in &bound.params {
                query = bind_postgres_param(query, param);
            }
            query.fetch_all(&mut *tx).await?
        };

        tx.commit().await?;
        Ok(process_rows(rows, start))
    }
}

mod oracle {
    use super::*;
    use crate::db::oracle::OracleEngine;
    use crate::db::params::oracle_params;
    use crate::db::types::oracle::{column_layout, row_to_json};
    use ::oracle::Connection;
    use ::oracle::sql_type::ToSql;
    use serde_json::{Map, Value as JsonValue};
    use tracing::warn;

    pub async fn fetch_in_transaction(
        engine: &OracleEngine,
        bound: &BoundSql,
        start: Instant,
    ) -> DbResult<QueryResult> {
        let sql = statement_text(&bound.sql).to_string();
        let params = bound.params.clone();

        engine
            .run(move |conn| {
                let values = oracle_params(&params);
                let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
                let fetched = fetch(conn, &sql, &refs);
                if let Err(e) = conn.rollback() {
                    warn!(error = %e, "Failed to end Oracle transaction");
                }
                let (columns, rows) = fetched?;
                Ok(QueryResult {
                    columns,
                    rows,
                    execution_time_ms: start.elapsed().as_millis() as u64,
                })
            })
            .await
    }

    fn fetch(
        conn: &Connection,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<(Vec<String>, Vec<Map<String, JsonValue>>)> {
        let result_set = conn.query(sql, params)?;
        let layout = column_layout(result_set.column_info());
        let rows = result_set
            .map(|row| row.map(|row| row_to_json(&layout, &row)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((layout.into_iter().map(|(name, ..)| name).collect(), rows))
    }

    /// OCI rejects a trailing `;` on SQL statements.
    pub(super) fn statement_text(sql: &str) -> &str {
        sql.trim_end().trim_end_matches(';').trim_end()
    }
}
