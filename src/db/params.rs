//! Parameter binding utilities for database queries.
//!
//! Callers pass named parameters (`:name` in the SQL text). This module rewrites
//! them to the positional placeholders each driver expects and binds the values.

use crate::error::{DbError, DbResult};
use crate::models::{Dialect, QueryParam, QueryParams};
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::{MySql, Postgres};
use std::collections::HashMap;

/// SQL with positional placeholders plus the values in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

/// Rewrite `:name` references to `?` (MySQL), `$n` (PostgreSQL) or `:n` (Oracle).
///
/// Quoted strings, quoted identifiers, comments and `::` casts are copied
/// verbatim. A name used twice reuses the same `$n` for PostgreSQL and binds
/// once per use elsewhere: Oracle binds by position, not by name.
pub fn bind_named(sql: &str, params: &QueryParams, dialect: Dialect) -> DbResult<BoundSql> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut bound = Vec::new();
    let mut pg_slots: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                let end = find_closing(&chars, i + 1, c);
                out.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map(|p| i + p + 1)
                    .unwrap_or(chars.len());
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let end = chars[i + 2..]
                    .windows(2)
                    .position(|w| w == ['*', '/'])
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(chars.len());
                out.extend(&chars[i..end]);
                i = end;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars
                .get(i + 1)
                .is_some_and(|ch| ch.is_ascii_alphabetic() || *ch == '_') =>
            {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_'))
                    .map(|p| start + p)
                    .unwrap_or(chars.len());
                let name: String = chars[start..end].iter().collect();
                let value = params.get(&name).ok_or_else(|| {
                    DbError::invalid_argument(format!("Missing value for query parameter ':{}'", name))
                })?;

                match dialect {
                    Dialect::PostgreSql => {
                        let slot = match pg_slots.get(&name).copied() {
                            Some(slot) => slot,
                            None => {
                                bound.push(value.clone());
                                pg_slots.insert(name, bound.len());
                                bound.len()
                            }
                        };
                        out.push('$');
                        out.push_str(&slot.to_string());
                    }
                    Dialect::MySql => {
                        bound.push(value.clone());
                        out.push('?');
                    }
                    Dialect::Oracle => {
                        bound.push(value.clone());
                        out.push(':');
                        out.push_str(&bound.len().to_string());
                    }
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(BoundSql {
        sql: out,
        params: bound,
    })
}

/// Index just past the quote closing the literal opened before `from`.
fn find_closing(chars: &[char], from: usize, quote: char) -> usize {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '\\' && quote == '\'' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Owned Oracle bind values, in binding order.
///
/// Booleans bind as 1/0: only Oracle 23ai has a SQL BOOLEAN.
pub(crate) fn oracle_params(params: &[QueryParam]) -> Vec<Box<dyn oracle::sql_type::ToSql>> {
    params
        .iter()
        .map(|param| -> Box<dyn oracle::sql_type::ToSql> {
            match param {
                QueryParam::Null => Box::new(None::<String>),
                QueryParam::Bool(v) => Box::new(i64::from(*v)),
                QueryParam::Int(v) => Box::new(*v),
                QueryParam::Float(v) => Box::new(*v),
                QueryParam::String(v) => Box::new(v.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, QueryParam)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_mysql_positional() {
        let p = params(&[("id", QueryParam::Int(1)), ("name", "x".into())]);
        let bound = bind_named(
            "SELECT * FROM city WHERE id = :id AND name = :name OR id = :id",
            &p,
            Dialect::MySql,
        )
        .unwrap();
        assert_eq!(
            bound.sql,
            "SELECT * FROM city WHERE id = ? AND name = ? OR id = ?"
        );
        assert_eq!(
            bound.params,
            vec![QueryParam::Int(1), QueryParam::from("x"), QueryParam::Int(1)]
        );
    }

    #[test]
    fn test_postgres_numbered_and_reused() {
        let p = params(&[("id", QueryParam::Int(1)), ("name", "x".into())]);
        let bound = bind_named(
            "SELECT * FROM city WHERE id = :id AND name = :name OR id = :id",
            &p,
            Dialect::PostgreSql,
        )
        .unwrap();
        assert_eq!(
            bound.sql,
            "SELECT * FROM city WHERE id = $1 AND name = $2 OR id = $1"
        );
        assert_eq!(bound.params.len(), 2);
    }

    #[test]
    fn test_oracle_numbered_per_use() {
        let p = params(&[("id", QueryParam::Int(1)), ("name", "x".into())]);
        let bound = bind_named(
            "SELECT * FROM city WHERE id = :id AND name = :name OR id = :id",
            &p,
            Dialect::Oracle,
        )
        .unwrap();
        assert_eq!(
            bound.sql,
            "SELECT * FROM city WHERE id = :1 AND name = :2 OR id = :3"
        );
        assert_eq!(bound.params.len(), 3);
        assert_eq!(oracle_params(&bound.params).len(), 3);
    }

    #[test]
    fn test_casts_strings_and_comments_untouched() {
        let p = params(&[("v", "1".into())]);
        let sql = "SELECT ':skip', \"a:b\", x::text -- :c\n FROM t /* :d */ WHERE y = :v";
        let bound = bind_named(sql, &p, Dialect::PostgreSql).unwrap();
        assert_eq!(
            bound.sql,
            "SELECT ':skip', \"a:b\", x::text -- :c\n FROM t /* :d */ WHERE y = $1"
        );
        assert_eq!(bound.params, vec![QueryParam::from("1")]);
    }

    #[test]
    fn test_missing_parameter() {
        let err = bind_named("SELECT :nope", &QueryParams::new(), Dialect::MySql).unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));
        assert!(err.to_string().contains(":nope"));
    }

    #[test]
    fn test_no_placeholders() {
        let bound = bind_named("SHOW DATABASES;", &QueryParams::new(), Dialect::MySql).unwrap();
        assert_eq!(bound.sql, "SHOW DATABASES;");
        assert!(bound.params.is_empty());
    }
}
