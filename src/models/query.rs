//! Query-related data models.
//!
//! This module defines named query parameters and raw query results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Named parameters, referenced as `:name` in SQL text.
pub type QueryParams = BTreeMap<String, QueryParam>;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// Column names in result order
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create an empty result (statement produced no rows).
    pub fn empty(execution_time_ms: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            execution_time_ms,
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the first column, rendered as strings. NULLs are skipped.
    pub fn first_column_strings(&self) -> Vec<String> {
        let Some(first) = self.columns.first() else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| match row.get(first) {
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(JsonValue::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_param_types() {
        assert!(QueryParam::Null.is_null());
        assert!(!QueryParam::Bool(true).is_null());
        assert_eq!(QueryParam::Int(42).type_name(), "int");
        assert_eq!(QueryParam::from("hello").type_name(), "string");
    }

    #[test]
    fn test_query_param_untagged_deserialize() {
        let params: QueryParams =
            serde_json::from_value(json!({"id": 7, "name": "x", "flag": true, "none": null}))
                .unwrap();
        assert_eq!(params["id"], QueryParam::Int(7));
        assert_eq!(params["name"], QueryParam::String("x".into()));
        assert_eq!(params["flag"], QueryParam::Bool(true));
        assert_eq!(params["none"], QueryParam::Null);
    }

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::empty(10);
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
        assert!(result.first_column_strings().is_empty());
    }

    #[test]
    fn test_first_column_strings() {
        let row = |v: JsonValue| {
            let mut m = serde_json::Map::new();
            m.insert("Database".to_string(), v);
            m
        };
        let result = QueryResult {
            columns: vec!["Database".to_string()],
            rows: vec![row(json!("world")), row(JsonValue::Null), row(json!(12))],
            execution_time_ms: 1,
        };
        assert_eq!(result.first_column_strings(), vec!["world", "12"]);
    }
}
