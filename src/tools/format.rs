//! Schema report rendering.
//!
//! Layout of one database's report:
//!
//! ```text
//! Database Name        Tables                         Columns
//! --------------------------------------------------------------------------------------------------------------
//! world                city                           id, name, countrycode
//!                                                    Relationships: countrycode -> country.code
//! ```
//!
//! Each data row pads the database name to 20, the table name to 30 and the
//! column list to 60 characters. Relationships continue on the next line,
//! indented 51 spaces so they sit under the Columns field.

use crate::models::TableMetadata;

const DATABASE_WIDTH: usize = 20;
const TABLE_WIDTH: usize = 30;
const COLUMNS_WIDTH: usize = 60;
const SEPARATOR_WIDTH: usize = 110;
const RELATIONSHIP_INDENT: usize = 51;

pub const NO_METADATA_SPECIFIED: &str = "No metadata found for the specified databases.";
pub const NO_METADATA_DISCOVERED: &str = "No metadata found for the discovered databases.";
pub const NO_DATABASES: &str = "No databases found or failed to fetch databases.";

/// Where the databases of a combined report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// Named by the caller
    Specified,
    /// Found by listing the server
    Discovered,
}

impl ReportScope {
    fn empty_message(self) -> &'static str {
        match self {
            Self::Specified => NO_METADATA_SPECIFIED,
            Self::Discovered => NO_METADATA_DISCOVERED,
        }
    }
}

/// Render one database's tables.
pub fn render_one(database: &str, tables: &[TableMetadata]) -> String {
    if tables.is_empty() {
        return format!("No metadata found for database: {}", database);
    }

    let mut lines = Vec::with_capacity(tables.len() + 2);
    lines.push(format!(
        "{:<dw$} {:<tw$} {:<cw$}",
        "Database Name",
        "Tables",
        "Columns",
        dw = DATABASE_WIDTH,
        tw = TABLE_WIDTH,
        cw = COLUMNS_WIDTH
    ));
    lines.push("-".repeat(SEPARATOR_WIDTH));

    for table in tables {
        lines.push(format!(
            "{:<dw$} {:<tw$} {:<cw$}{}",
            database,
            table.name,
            table.columns.join(", "),
            relationships(table),
            dw = DATABASE_WIDTH,
            tw = TABLE_WIDTH,
            cw = COLUMNS_WIDTH
        ));
    }

    lines.join("\n")
}

fn relationships(table: &TableMetadata) -> String {
    if table.foreign_keys.is_empty() {
        return String::new();
    }
    let refs: Vec<String> = table.foreign_keys.iter().map(ToString::to_string).collect();
    format!(
        "\n{}Relationships: {}",
        " ".repeat(RELATIONSHIP_INDENT),
        refs.join(", ")
    )
}

/// Render every database that has tables, separated by a blank line.
///
/// Entries with no tables are skipped. If nothing is left, the scope's
/// "no metadata" message is returned instead.
pub fn render_all<S>(entries: &[(S, Vec<TableMetadata>)], scope: ReportScope) -> String
where
    S: AsRef<str>,
{
    let reports: Vec<String> = entries
        .iter()
        .filter(|(_, tables)| !tables.is_empty())
        .map(|(database, tables)| render_one(database.as_ref(), tables))
        .collect();

    if reports.is_empty() {
        return scope.empty_message().to_string();
    }
    reports.join("\n\n")
}
