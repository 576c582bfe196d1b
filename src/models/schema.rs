//! Schema-related data models.
//!
//! This module defines the reflected structure of one database: its tables,
//! their columns and the foreign keys leaving each column.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableMetadata {
    pub name: String,
    /// Catalog (ordinal) order
    pub columns: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableMetadata {
    /// Create a new table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Append several columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a foreign key.
    pub fn with_foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_keys.push(fk);
        self
    }
}

/// One outgoing reference from `source_column` to `target_table.target_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyRef {
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl ForeignKeyRef {
    pub fn new(
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }
}

impl std::fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}.{}",
            self.source_column, self.target_table, self.target_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_display() {
        let fk = ForeignKeyRef::new("emp_id", "employees", "id");
        assert_eq!(fk.to_string(), "emp_id -> employees.id");
    }

    #[test]
    fn test_table_builder_keeps_column_order() {
        let table = TableMetadata::new("city")
            .with_columns(["id", "name"])
            .with_column("countrycode");
        assert_eq!(table.columns, vec!["id", "name", "countrycode"]);
        assert!(table.foreign_keys.is_empty());
    }
}
