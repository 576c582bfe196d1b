//! Schema introspection.
//!
//! [`SchemaInspector`] answers the two questions a schema report needs: which
//! databases does the server host, and what tables, columns and foreign keys
//! does one of them contain.
//!
//! # Architecture
//!
//! SQL is kept in the `queries` submodule, one constant set per dialect.
//! Dialect-specific reflection lives in the `mysql`, `postgres` and `oracle`
//! submodules, each providing the same interface. Reflection reads the
//! connection's default schema: the database itself on MySQL,
//! `current_schema()` on PostgreSQL and the connecting user's own tables on
//! Oracle.

use crate::db::engine::{DbPool, EngineManager};
use crate::db::executor::QueryExecutor;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::error::{DbError, DbResult};
use crate::models::{ForeignKeyRef, TableMetadata};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Where schema reports get their data.
///
/// Both methods swallow failures (after reporting them): an empty listing and
/// `None` are the only failure signals.
pub trait SchemaSource {
    /// Names of every database on the server.
    fn list_all_databases(&self) -> impl Future<Output = Vec<String>> + Send;

    /// Tables of one database, or of the server root when `None`.
    ///
    /// `None` means reflection failed; `Some(vec![])` means there are no tables.
    fn reflect(
        &self,
        database: Option<&str>,
    ) -> impl Future<Output = Option<Vec<TableMetadata>>> + Send;
}

/// Schema inspector backed by a live server.
#[derive(Debug, Clone)]
pub struct SchemaInspector {
    executor: QueryExecutor,
    sink: Arc<dyn DiagnosticSink>,
}

impl SchemaInspector {
    pub fn new(engines: EngineManager, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            executor: QueryExecutor::new(engines, sink.clone()),
            sink,
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    fn engines(&self) -> &EngineManager {
        self.executor.engines()
    }

    /// List every database on the server using the dialect's catalog query.
    ///
    /// The first column of each row is taken as the name. Failure is reported
    /// and yields an empty list.
    pub async fn list_all_databases(&self) -> Vec<String> {
        match self.try_list_all_databases().await {
            Ok(names) => {
                info!(count = names.len(), "Listed databases");
                names
            }
            Err(e) => {
                self.sink
                    .report(Diagnostic::from_error(Stage::ListDatabases, None, &e));
                Vec::new()
            }
        }
    }

    async fn try_list_all_databases(&self) -> DbResult<Vec<String>> {
        let dialect = self.executor.dialect();
        let sql = dialect
            .list_databases_sql()
            .ok_or_else(|| DbError::unsupported_dialect(dialect.as_str()))?;

        let result = self.executor.try_run(sql, "", None).await?;
        Ok(result.first_column_strings())
    }

    /// Reflect the base tables of `database`.
    ///
    /// Failure (connection or catalog query) is reported and yields `None`.
    pub async fn reflect(&self, database: Option<&str>) -> Option<Vec<TableMetadata>> {
        let label = database.unwrap_or_default();
        let result = self
            .engines()
            .with_engine(database, |pool| async move {
                let tables = match pool {
                    DbPool::MySql(p) => mysql::reflect(&p).await,
                    DbPool::Postgres(p) => postgres::reflect(&p).await,
                    DbPool::Oracle(e) => oracle::reflect(&e).await,
                };
                tables.map_err(|e| DbError::reflection(label, e.to_string()))
            })
            .await;

        match result {
            Ok(tables) => {
                debug!(database = %label, tables = tables.len(), "Reflected database");
                Some(tables)
            }
            Err(e) => {
                self.sink
                    .report(Diagnostic::from_error(Stage::Reflect, database, &e));
                None
            }
        }
    }
}

impl SchemaSource for SchemaInspector {
    fn list_all_databases(&self) -> impl Future<Output = Vec<String>> + Send {
        SchemaInspector::list_all_databases(self)
    }

    fn reflect(
        &self,
        database: Option<&str>,
    ) -> impl Future<Output = Option<Vec<TableMetadata>>> + Send {
        SchemaInspector::reflect(self, database)
    }
}

/// Order foreign keys by their source column's position.
///
/// Keys on the same column keep catalog order; keys whose source column is
/// not among `columns` go last.
fn order_foreign_keys(columns: &[String], mut keys: Vec<ForeignKeyRef>) -> Vec<ForeignKeyRef> {
    keys.sort_by_key(|fk| {
        columns
            .iter()
            .position(|c| *c == fk.source_column)
            .unwrap_or(usize::MAX)
    });
    keys
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        // relkind: r = ordinary table, p = partitioned table
        pub const LIST_TABLES: &str = r#"
            SELECT c.relname::text AS table_name
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = current_schema()
            AND c.relkind IN ('r', 'p')
            "#;

        pub const LIST_COLUMNS: &str = r#"
            SELECT column_name::text AS column_name
            FROM information_schema.columns
            WHERE table_schema = current_schema()
            AND table_name = $1
            ORDER BY ordinal_position
            "#;

        pub const LIST_FOREIGN_KEYS: &str = r#"
            SELECT
                a.attname::text AS column_name,
                ft.relname::text AS foreign_table_name,
                fa.attname::text AS foreign_column_name
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_class ft ON ft.oid = con.confrelid
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(attnum, fattnum)
            JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
            JOIN pg_catalog.pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = k.fattnum
            WHERE con.contype = 'f'
            AND n.nspname = current_schema()
            AND t.relname = $1
            ORDER BY con.conname
            "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            "#;

        pub const LIST_COLUMNS: &str = r#"
            SELECT CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#;

        pub const LIST_FOREIGN_KEYS: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
                CONVERT(REFERENCED_TABLE_NAME USING utf8) AS REFERENCED_TABLE_NAME,
                CONVERT(REFERENCED_COLUMN_NAME USING utf8) AS REFERENCED_COLUMN_NAME
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
            "#;
    }

    pub mod oracle {
        // Nested tables and IOT overflow segments show up in USER_TABLES too
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM user_tables
            WHERE nested = 'NO'
            AND secondary = 'N'
            AND (iot_type IS NULL OR iot_type <> 'IOT_OVERFLOW')
            AND dropped = 'NO'
            "#;

        pub const LIST_COLUMNS: &str = r#"
            SELECT column_name
            FROM user_tab_columns
            WHERE table_name = :1
            ORDER BY column_id
            "#;

        // The referenced table may belong to another owner, hence ALL_*
        pub const LIST_FOREIGN_KEYS: &str = r#"
            SELECT
                cc.column_name,
                rc.table_name,
                rcc.column_name
            FROM user_constraints c
            JOIN user_cons_columns cc
                ON cc.constraint_name = c.constraint_name
            JOIN all_constraints rc
                ON rc.owner = c.r_owner
                AND rc.constraint_name = c.r_constraint_name
            JOIN all_cons_columns rcc
                ON rcc.owner = rc.owner
                AND rcc.constraint_name = rc.constraint_name
                AND rcc.position = cc.position
            WHERE c.constraint_type = 'R'
            AND c.table_name = :1
            ORDER BY c.constraint_name, cc.position
            "#;
    }
}

// =============================================================================
// Dialect-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn reflect(pool: &PgPool) -> DbResult<Vec<TableMetadata>> {
        let names = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("table_name"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = fetch_columns(pool, &name).await?;
            let foreign_keys = order_foreign_keys(&columns, fetch_foreign_keys(pool, &name).await?);
            tables.push(TableMetadata {
                name,
                columns,
                foreign_keys,
            });
        }
        Ok(tables)
    }

    async fn fetch_columns(pool: &PgPool, table_name: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("column_name").map_err(DbError::from))
            .collect()
    }

    async fn fetch_foreign_keys(pool: &PgPool, table_name: &str) -> DbResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::postgres::LIST_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<ForeignKeyRef> {
                Ok(ForeignKeyRef::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("foreign_table_name")?,
                    row.try_get::<String, _>("foreign_column_name")?,
                ))
            })
            .collect()
    }
}

mod mysql {
    use super::*;
    use sqlx::mysql::MySqlRow;
    use sqlx::{MySqlPool, Row};

    /// Get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &MySqlRow, column: &str) -> DbResult<String> {
        match row.try_get::<String, _>(column) {
            Ok(value) => Ok(value),
            Err(_) => utf8_value(row.try_get::<Vec<u8>, _>(column)?, column),
        }
    }

    pub(super) fn utf8_value(bytes: Vec<u8>, column: &str) -> DbResult<String> {
        String::from_utf8(bytes)
            .map_err(|e| DbError::internal(format!("{column} is not valid UTF-8: {e}")))
    }

    pub async fn reflect(pool: &MySqlPool) -> DbResult<Vec<TableMetadata>> {
        let names: Vec<String> = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| get_string(row, "TABLE_NAME"))
            .collect::<DbResult<_>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = fetch_columns(pool, &name).await?;
            let foreign_keys = order_foreign_keys(&columns, fetch_foreign_keys(pool, &name).await?);
            tables.push(TableMetadata {
                name,
                columns,
                foreign_keys,
            });
        }
        Ok(tables)
    }

    async fn fetch_columns(pool: &MySqlPool, table_name: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| get_string(row, "COLUMN_NAME"))
            .collect()
    }

    async fn fetch_foreign_keys(
        pool: &MySqlPool,
        table_name: &str,
    ) -> DbResult<Vec<ForeignKeyRef>> {
        let rows = sqlx::query(queries::mysql::LIST_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<ForeignKeyRef> {
                Ok(ForeignKeyRef::new(
                    get_string(row, "COLUMN_NAME")?,
                    get_string(row, "REFERENCED_TABLE_NAME")?,
                    get_string(row, "REFERENCED_COLUMN_NAME")?,
                ))
            })
            .collect()
    }
}

mod oracle {
    use super::*;
    use crate::db::oracle::OracleEngine;
    use ::oracle::Connection;

    pub async fn reflect(engine: &OracleEngine) -> DbResult<Vec<TableMetadata>> {
        engine.run(reflect_blocking).await
    }

    fn reflect_blocking(conn: &Connection) -> DbResult<Vec<TableMetadata>> {
        let names = conn
            .query_as::<String>(queries::oracle::LIST_TABLES, &[])?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for raw_name in names {
            let columns: Vec<String> = conn
                .query_as::<String>(queries::oracle::LIST_COLUMNS, &[&raw_name])?
                .map(|name| name.map(|name| normalize_name(&name)))
                .collect::<Result<_, _>>()?;
            let keys = conn
                .query_as::<(String, String, String)>(
                    queries::oracle::LIST_FOREIGN_KEYS,
                    &[&raw_name],
                )?
                .map(|key| {
                    key.map(|(column, table, target)| {
                        ForeignKeyRef::new(
                            normalize_name(&column),
                            normalize_name(&table),
                            normalize_name(&target),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            tables.push(TableMetadata {
                name: normalize_name(&raw_name),
                foreign_keys: order_foreign_keys(&columns, keys),
                columns,
            });
        }
        Ok(tables)
    }

    /// Oracle folds unquoted identifiers to upper case; report them in lower
    /// case like the other dialects. Quoted mixed-case names are kept.
    pub(super) fn normalize_name(name: &str) -> String {
        if name.chars().any(char::is_lowercase) {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::diagnostics::MemorySink;
    use crate::models::ConnectionDescriptor;

    fn inspector(dialect: &str) -> (SchemaInspector, MemorySink) {
        let descriptor =
            ConnectionDescriptor::new("root", "pw", "127.0.0.1", 1, dialect, "").unwrap();
        let options = PoolOptions {
            acquire_timeout_secs: Some(2),
            ..Default::default()
        };
        let sink = MemorySink::new();
        let engines = EngineManager::new(Arc::new(descriptor), options);
        (SchemaInspector::new(engines, Arc::new(sink.clone())), sink)
    }

    #[test]
    fn test_order_foreign_keys_follows_columns() {
        let columns: Vec<String> = ["id", "country_id", "mayor_id"]
            .into_iter()
            .map(String::from)
            .collect();
        let keys = vec![
            ForeignKeyRef::new("mayor_id", "person", "id"),
            ForeignKeyRef::new("ghost", "x", "y"),
            ForeignKeyRef::new("country_id", "country", "id"),
            ForeignKeyRef::new("mayor_id", "official", "id"),
        ];
        let ordered = order_foreign_keys(&columns, keys);
        let targets: Vec<&str> = ordered.iter().map(|k| k.target_table.as_str()).collect();
        assert_eq!(targets, ["country", "person", "official", "x"]);
    }

    #[tokio::test]
    async fn test_list_unreachable_is_empty_with_diagnostic() {
        let (inspector, sink) = inspector("mysql");
        assert!(inspector.list_all_databases().await.is_empty());

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stage, Stage::ListDatabases);
        assert!(entries[0].database.is_none());
    }

    #[tokio::test]
    async fn test_reflect_unreachable_is_none_with_diagnostic() {
        let (inspector, sink) = inspector("postgresql");
        assert!(inspector.reflect(Some("world")).await.is_none());

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stage, Stage::Reflect);
        assert_eq!(entries[0].database.as_deref(), Some("world"));
        assert!(entries[0].suggestion.is_some());
    }

    #[tokio::test]
    async fn test_oracle_unreachable_reflect_is_none() {
        let (inspector, sink) = inspector("oracle");
        assert!(SchemaSource::reflect(&inspector, Some("orcl")).await.is_none());

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stage, Stage::Reflect);
        assert!(entries[0].message.contains("Oracle"));
    }

    #[test]
    fn test_oracle_normalize_name() {
        assert_eq!(oracle::normalize_name("CITY"), "city");
        assert_eq!(oracle::normalize_name("COUNTRY_CODE2"), "country_code2");
        assert_eq!(oracle::normalize_name("MixedCase"), "MixedCase");
        assert_eq!(oracle::normalize_name("lower"), "lower");
        assert_eq!(oracle::normalize_name("_1"), "_1");
    }

    #[test]
    fn test_mysql_undecodable_name_is_error() {
        assert_eq!(mysql::utf8_value(b"city".to_vec(), "TABLE_NAME").unwrap(), "city");

        let err = mysql::utf8_value(vec![0x63, 0xff, 0xfe], "TABLE_NAME").unwrap_err();
        assert!(matches!(err, DbError::Internal { .. }));
        assert!(err.to_string().contains("TABLE_NAME"));
    }
}
