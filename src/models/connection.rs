//! Connection-related data models.
//!
//! This module defines the dialect registry and the connection descriptor
//! that every engine, query and reflection call is built from.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use url::Url;

/// Placeholder shown instead of the password in displayable URLs.
pub const PASSWORD_MASK: &str = "****";

/// Supported SQL dialects.
///
/// The set is closed: every dialect maps to a driver identifier and to the
/// SQL used to enumerate the databases visible to the current credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Includes MariaDB
    MySql,
    PostgreSql,
    Oracle,
}

impl Dialect {
    /// Every registered dialect, in registry order.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::PostgreSql, Dialect::Oracle];

    /// Identifiers accepted by [`Dialect::from_str`].
    pub fn names() -> [&'static str; 3] {
        Self::ALL.map(|d| d.as_str())
    }

    /// Identifier used in connection URLs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
        }
    }

    /// Driver identifier placed after the `+` in connection URLs.
    pub fn driver(&self) -> &'static str {
        match self {
            Self::MySql => "sqlx_mysql",
            Self::PostgreSql => "sqlx_postgres",
            Self::Oracle => "oci",
        }
    }

    /// Dialect-specific SQL listing every database on the server.
    pub fn list_databases_sql(&self) -> Option<&'static str> {
        match self {
            Self::MySql => Some("SHOW DATABASES;"),
            Self::PostgreSql => Some("SELECT datname FROM pg_database WHERE datistemplate = false;"),
            Self::Oracle => Some("SELECT name FROM v$database;"),
        }
    }

    /// URL scheme understood by the sqlx driver; `None` for Oracle, which
    /// takes an Easy Connect string instead.
    pub fn driver_scheme(&self) -> Option<&'static str> {
        match self {
            Self::MySql => Some("mysql"),
            Self::PostgreSql => Some("postgres"),
            Self::Oracle => None,
        }
    }

    /// Get the display name for this dialect.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
            Self::Oracle => "Oracle",
        }
    }

    /// Get the default port for this dialect.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::PostgreSql => 5432,
            Self::Oracle => 1521,
        }
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DbError::unsupported_dialect(s))
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Normalized database-name argument.
///
/// A single name becomes a one-element list (or an empty list when blank);
/// a list is kept as given. An empty selection means "every database the
/// credentials can see".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSelection(Vec<String>);

impl DatabaseSelection {
    pub fn single(name: &str) -> Self {
        if name.trim().is_empty() {
            Self(Vec::new())
        } else {
            Self(vec![name.to_string()])
        }
    }

    pub fn list(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for DatabaseSelection {
    fn from(name: &str) -> Self {
        Self::single(name)
    }
}

impl From<String> for DatabaseSelection {
    fn from(name: String) -> Self {
        Self::single(&name)
    }
}

impl From<Option<String>> for DatabaseSelection {
    fn from(name: Option<String>) -> Self {
        name.map(Self::from).unwrap_or_default()
    }
}

impl From<Vec<String>> for DatabaseSelection {
    fn from(names: Vec<String>) -> Self {
        Self::list(names)
    }
}

impl From<&[&str]> for DatabaseSelection {
    fn from(names: &[&str]) -> Self {
        Self::list(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for DatabaseSelection {
    fn from(names: [&str; N]) -> Self {
        Self::list(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Loosely-typed input, as received from tool calls.
impl TryFrom<JsonValue> for DatabaseSelection {
    type Error = DbError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(Self::default()),
            JsonValue::String(name) => Ok(Self::single(&name)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(name) => Ok(name),
                    other => Err(DbError::invalid_argument(format!(
                        "database_name list entries must be strings, got {}",
                        other
                    ))),
                })
                .collect::<DbResult<Vec<_>>>()
                .map(Self::list),
            other => Err(DbError::invalid_argument(format!(
                "database_name must be a string or a list of strings, got {}",
                other
            ))),
        }
    }
}

/// Credentials, server address, dialect and target databases.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    username: String,
    /// Contains sensitive data - never log
    password: String,
    hostname: String,
    port: u16,
    dialect: Dialect,
    target_databases: Vec<String>,
}

impl ConnectionDescriptor {
    /// Create a new descriptor.
    ///
    /// Fails with `UnsupportedDialect` for an unknown dialect and with
    /// `InvalidArgument` when `databases` has an unsupported shape.
    pub fn new<D>(
        username: impl Into<String>,
        password: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        dialect: &str,
        databases: D,
    ) -> DbResult<Self>
    where
        D: TryInto<DatabaseSelection>,
        D::Error: Into<DbError>,
    {
        let dialect = Dialect::from_str(dialect)?;
        let target_databases = databases
            .try_into()
            .map_err(Into::<DbError>::into)?
            .into_inner();

        Ok(Self {
            username: username.into(),
            password: password.into(),
            hostname: hostname.into(),
            port,
            dialect,
            target_databases,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn target_databases(&self) -> &[String] {
        &self.target_databases
    }

    /// Build the `<dialect>+<driver>://user:password@host:port[/database]` URL.
    ///
    /// With `mask_password` the password is replaced by [`PASSWORD_MASK`],
    /// which makes the result safe to log or display.
    pub fn build_url(&self, mask_password: bool, database: Option<&str>) -> String {
        let password = if mask_password {
            PASSWORD_MASK
        } else {
            self.password.as_str()
        };
        let base = format!(
            "{}+{}://{}:{}@{}:{}",
            self.dialect.as_str(),
            self.dialect.driver(),
            self.username,
            password,
            self.hostname,
            self.port
        );
        match database.filter(|db| !db.is_empty()) {
            Some(db) => format!("{}/{}", base, db),
            None => base,
        }
    }

    /// Password for the native driver. Never log this.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Build the address consumed by the native driver.
    ///
    /// sqlx dialects get a URL with the real, percent-encoded credentials.
    /// Oracle gets an Easy Connect string (`//host:port[/service]`); its
    /// credentials travel separately.
    pub fn driver_url(&self, database: Option<&str>) -> DbResult<String> {
        let database = database.filter(|db| !db.is_empty());
        let Some(scheme) = self.dialect.driver_scheme() else {
            return Ok(self.easy_connect(database));
        };

        let invalid = |what: &str| {
            DbError::invalid_argument(format!("Cannot use {} in a connection URL", what))
        };

        let mut url = Url::parse(&format!("{}://{}", scheme, self.hostname))
            .map_err(|e| DbError::invalid_argument(format!("Invalid hostname: {e}")))?;
        url.set_port(Some(self.port)).map_err(|_| invalid("port"))?;
        url.set_username(&self.username)
            .map_err(|_| invalid("username"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("password"))?;
        if let Some(db) = database {
            url.set_path(db);
        }
        Ok(url.to_string())
    }

    fn easy_connect(&self, service: Option<&str>) -> String {
        let host = if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]", self.hostname)
        } else {
            self.hostname.clone()
        };
        match service {
            Some(service) => format!("//{}:{}/{}", host, self.port, service),
            None => format!("//{}:{}", host, self.port),
        }
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("url", &self.build_url(true, None))
            .field("target_databases", &self.target_databases)
            .finish()
    }
}
