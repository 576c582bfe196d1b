//! Read-only enforcement for caller-supplied SQL.
//!
//! The `query` tool accepts arbitrary SQL from an agent. Statements are parsed
//! with [sqlparser](https://docs.rs/sqlparser/) and anything other than a
//! read (SELECT, SHOW, DESCRIBE, EXPLAIN of a read) is rejected before a
//! connection is opened.

use crate::error::{DbError, DbResult};
use crate::models::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

/// Type of SQL statement detected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStatementType {
    /// SELECT, SHOW, DESCRIBE, VALUES
    Read,
    /// INSERT, UPDATE, DELETE, MERGE, COPY
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// CALL, EXECUTE, GRANT, SET and everything unrecognized
    Other,
}

mod error_messages {
    pub const DML_WRITE: &str = "Schema reporting is read-only; data modification is not allowed.";
    pub const DDL: &str = "Schema reporting is read-only; schema changes are not allowed.";
    pub const TRANSACTION: &str =
        "Transaction control is not allowed; every query already runs in its own transaction.";
    pub const OTHER: &str = "Only SELECT, SHOW, DESCRIBE and EXPLAIN statements are allowed.";
    pub const PARSE_ERROR: &str = "Failed to parse SQL statement.";
}

fn parser_dialect(dialect: Dialect) -> Box<dyn sqlparser::dialect::Dialect> {
    match dialect {
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::PostgreSql => Box::new(PostgreSqlDialect {}),
        Dialect::Oracle => Box::new(GenericDialect {}),
    }
}

/// Validate that every statement in `sql` only reads.
///
/// Returns `Err(DbError::Permission)` naming the first offending statement, or
/// `Err(DbError::InvalidArgument)` if the text does not parse.
///
/// ```
/// use schema_report::models::Dialect;
/// use schema_report::tools::sql_validator::validate_readonly;
///
/// assert!(validate_readonly("SELECT * FROM city", Dialect::MySql).is_ok());
/// assert!(validate_readonly("DROP TABLE city", Dialect::MySql).is_err());
/// ```
pub fn validate_readonly(sql: &str, dialect: Dialect) -> DbResult<()> {
    let parser = parser_dialect(dialect);

    let statements = Parser::parse_sql(parser.as_ref(), sql).map_err(|e| {
        DbError::invalid_argument(format!("{} Error: {}", error_messages::PARSE_ERROR, e))
    })?;

    if statements.is_empty() {
        return Err(DbError::invalid_argument("Empty SQL statement"));
    }

    statements.iter().try_for_each(validate_statement)
}

fn validate_statement(stmt: &Statement) -> DbResult<()> {
    let (stmt_type, operation) = classify_statement(stmt);
    let reason = match stmt_type {
        SqlStatementType::Read => return Ok(()),
        SqlStatementType::DmlWrite => error_messages::DML_WRITE,
        SqlStatementType::Ddl => error_messages::DDL,
        SqlStatementType::Transaction => error_messages::TRANSACTION,
        SqlStatementType::Other => error_messages::OTHER,
    };
    Err(DbError::permission(operation, reason))
}

/// Classify a parsed statement into a statement type.
pub fn classify_statement(stmt: &Statement) -> (SqlStatementType, &'static str) {
    match stmt {
        Statement::Query(_) => (SqlStatementType::Read, "SELECT"),
        Statement::ShowTables { .. } => (SqlStatementType::Read, "SHOW TABLES"),
        Statement::ShowColumns { .. } => (SqlStatementType::Read, "SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => (SqlStatementType::Read, "SHOW DATABASES"),
        Statement::ShowSchemas { .. } => (SqlStatementType::Read, "SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => (SqlStatementType::Read, "SHOW CREATE"),
        Statement::ShowVariable { .. } => (SqlStatementType::Read, "SHOW VARIABLE"),
        Statement::ShowVariables { .. } => (SqlStatementType::Read, "SHOW VARIABLES"),
        Statement::ShowStatus { .. } => (SqlStatementType::Read, "SHOW STATUS"),
        Statement::ExplainTable { .. } => (SqlStatementType::Read, "DESCRIBE"),

        // EXPLAIN is only as safe as what it explains (EXPLAIN ANALYZE runs it)
        Statement::Explain { statement, .. } => match classify_statement(statement) {
            (SqlStatementType::Read, _) => (SqlStatementType::Read, "EXPLAIN"),
            other => other,
        },

        Statement::Insert(_) => (SqlStatementType::DmlWrite, "INSERT"),
        Statement::Update { .. } => (SqlStatementType::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (SqlStatementType::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (SqlStatementType::DmlWrite, "MERGE"),
        Statement::Copy { .. } => (SqlStatementType::DmlWrite, "COPY"),

        Statement::CreateTable { .. } => (SqlStatementType::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (SqlStatementType::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (SqlStatementType::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (SqlStatementType::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (SqlStatementType::Ddl, "CREATE DATABASE"),
        Statement::CreateFunction { .. } => (SqlStatementType::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (SqlStatementType::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (SqlStatementType::Ddl, "CREATE TRIGGER"),
        Statement::AlterTable { .. } => (SqlStatementType::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (SqlStatementType::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (SqlStatementType::Ddl, "ALTER INDEX"),
        Statement::Drop { .. } => (SqlStatementType::Ddl, "DROP"),
        Statement::DropFunction { .. } => (SqlStatementType::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (SqlStatementType::Ddl, "DROP PROCEDURE"),
        Statement::Truncate { .. } => (SqlStatementType::Ddl, "TRUNCATE"),
        Statement::Comment { .. } => (SqlStatementType::Ddl, "COMMENT"),

        Statement::StartTransaction { .. } => (SqlStatementType::Transaction, "BEGIN"),
        Statement::Commit { .. } => (SqlStatementType::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (SqlStatementType::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (SqlStatementType::Transaction, "SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => (SqlStatementType::Transaction, "RELEASE SAVEPOINT"),

        Statement::Call { .. } => (SqlStatementType::Other, "CALL"),
        Statement::Execute { .. } => (SqlStatementType::Other, "EXECUTE"),
        Statement::Grant { .. } => (SqlStatementType::Other, "GRANT"),
        Statement::Revoke { .. } => (SqlStatementType::Other, "REVOKE"),
        Statement::Set(_) => (SqlStatementType::Other, "SET"),
        Statement::Use(_) => (SqlStatementType::Other, "USE"),
        Statement::Kill { .. } => (SqlStatementType::Other, "KILL"),
        Statement::LockTables { .. } => (SqlStatementType::Other, "LOCK"),
        _ => (SqlStatementType::Other, "Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_allowed() {
        for sql in [
            "SELECT * FROM city",
            "SELECT a FROM t1 UNION ALL SELECT b FROM t2",
            "SHOW DATABASES",
            "EXPLAIN SELECT 1",
        ] {
            assert!(validate_readonly(sql, Dialect::MySql).is_ok(), "{sql}");
        }
        assert!(
            validate_readonly(
                "SELECT datname FROM pg_database WHERE datistemplate = false;",
                Dialect::PostgreSql
            )
            .is_ok()
        );
    }

    #[test]
    fn test_named_placeholders_parse() {
        assert!(
            validate_readonly("SELECT * FROM city WHERE id = :id", Dialect::PostgreSql).is_ok()
        );
        assert!(validate_readonly("SELECT name::text FROM t", Dialect::PostgreSql).is_ok());
    }

    #[test]
    fn test_writes_rejected_as_permission() {
        for sql in [
            "INSERT INTO city VALUES (1)",
            "UPDATE city SET name = 'x'",
            "DELETE FROM city",
            "DROP TABLE city",
            "CREATE TABLE t (id INT)",
            "COMMIT",
        ] {
            let err = validate_readonly(sql, Dialect::PostgreSql).unwrap_err();
            assert!(matches!(err, DbError::Permission { .. }), "{sql}: {err}");
        }
    }

    #[test]
    fn test_mixed_batch_blocked() {
        let err = validate_readonly("SELECT 1; DELETE FROM city", Dialect::MySql).unwrap_err();
        assert!(err.to_string().contains("DELETE"));
    }

    #[test]
    fn test_insert_select_blocked() {
        let sql = "INSERT INTO archive SELECT * FROM city";
        assert!(validate_readonly(sql, Dialect::MySql).is_err());
    }

    #[test]
    fn test_unparseable_is_invalid_argument() {
        let err = validate_readonly("SELEC 1", Dialect::MySql).unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));
        let err = validate_readonly("", Dialect::MySql).unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));
    }
}
