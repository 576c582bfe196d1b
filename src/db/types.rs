//! Row decoding.
//!
//! Converts driver rows (sqlx and Oracle) into JSON maps for
//! [`QueryResult`](crate::models::QueryResult).
//!
//! Decoding is two-phase:
//! 1. `TypeCategory` classifies the column's type name
//! 2. a per-dialect decoder pulls the value out with the matching Rust type
//!
//! Values that cannot be decoded become `null` rather than failing the row.

use crate::models::Dialect;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Temporal,
    Interval,
    Unknown,
}

const INTEGER_TYPES: &[&str] = &[
    "tinyint",
    "smallint",
    "mediumint",
    "int",
    "integer",
    "bigint",
    "int2",
    "int4",
    "int8",
    "smallserial",
    "serial",
    "bigserial",
    "serial2",
    "serial4",
    "serial8",
    "oid",
];

const FLOAT_TYPES: &[&str] = &[
    "float",
    "float4",
    "float8",
    "double",
    "double precision",
    "real",
    "binary_float",
    "binary_double",
];

const BINARY_TYPES: &[&str] = &[
    "binary",
    "varbinary",
    "blob",
    "tinyblob",
    "mediumblob",
    "longblob",
    "bytea",
    "raw",
    "long raw",
];

/// MySQL sends spatial values as WKB.
const MYSQL_SPATIAL_TYPES: &[&str] = &[
    "geometry",
    "point",
    "linestring",
    "polygon",
    "multipoint",
    "multilinestring",
    "multipolygon",
    "geometrycollection",
];

/// Classify a database type name into a logical category.
///
/// Names are compared whole after dropping length/precision arguments and
/// MySQL's UNSIGNED/ZEROFILL, so `INTERVAL` or `POINT` never pass for an
/// integer type.
pub fn categorize_type(type_name: &str, dialect: Dialect) -> TypeCategory {
    let base = base_type_name(type_name);
    let name = base.as_str();

    if matches!(name, "decimal" | "numeric" | "number") {
        return TypeCategory::Decimal;
    }
    // MySQL reports TINYINT(1) as BOOLEAN already
    if matches!(name, "bool" | "boolean") {
        return TypeCategory::Boolean;
    }
    if INTEGER_TYPES.contains(&name) {
        return TypeCategory::Integer;
    }
    if FLOAT_TYPES.contains(&name) {
        return TypeCategory::Float;
    }
    if matches!(name, "json" | "jsonb") {
        return TypeCategory::Json;
    }
    if BINARY_TYPES.contains(&name)
        || (dialect == Dialect::MySql && MYSQL_SPATIAL_TYPES.contains(&name))
    {
        return TypeCategory::Binary;
    }
    if name.starts_with("interval") {
        return TypeCategory::Interval;
    }
    // date, datetime, time, timetz, timestamp[tz], timestamp with time zone
    if name == "date" || name == "datetime" || name.starts_with("time") {
        return TypeCategory::Temporal;
    }
    if name.contains("char")
        || name.contains("text")
        || matches!(name, "name" | "clob" | "nclob" | "enum" | "set")
    {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// Lowercased type name without `(...)` arguments or UNSIGNED/ZEROFILL.
///
/// `NUMBER(10,2)` becomes `number`, `TIMESTAMP(6) WITH TIME ZONE` becomes
/// `timestamp with time zone`.
fn base_type_name(type_name: &str) -> String {
    let mut stripped = String::with_capacity(type_name.len());
    let mut depth = 0usize;
    for c in type_name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.extend(c.to_lowercase()),
            _ => {}
        }
    }
    stripped
        .split_whitespace()
        .filter(|word| !matches!(*word, "unsigned" | "zerofill"))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// DECIMAL/NUMERIC kept as the server's exact text.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// UTF-8 text when the bytes are valid UTF-8, base64 otherwise.
///
/// MySQL returns `information_schema` and `SHOW` columns as VARBINARY on some
/// server versions, so readable bytes must stay readable.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
    fn column_names(&self) -> Vec<String>;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), Dialect::MySql);
                (col.name().to_string(), mysql::decode_column(self, idx, category))
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), Dialect::PostgreSql);
                (
                    col.name().to_string(),
                    postgres::decode_column(self, idx, category),
                )
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

// =============================================================================
// Dialect-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Temporal => decode_temporal(row, idx),
            TypeCategory::Binary
            | TypeCategory::Text
            | TypeCategory::Interval
            | TypeCategory::Unknown => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode DECIMAL");
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        // UNSIGNED columns only decode into unsigned types
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return float_value(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return float_value(v as f64);
        }
        JsonValue::Null
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<JsonValue>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }

    fn decode_temporal(row: &MySqlRow, idx: usize) -> JsonValue {
        use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

        if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return JsonValue::String(v.to_rfc3339());
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        JsonValue::Null
    }

    /// Text first, then raw bytes for VARBINARY-typed catalog columns.
    fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(JsonValue::String).unwrap_or(JsonValue::Null);
        }
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| decode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Temporal => decode_temporal(row, idx),
            TypeCategory::Interval => decode_interval(row, idx),
            TypeCategory::Text => decode_text(row, idx),
            TypeCategory::Unknown => decode_unknown(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode NUMERIC");
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        // oid and friends
        if let Ok(Some(v)) = row.try_get::<Option<sqlx::postgres::types::Oid>, _>(idx) {
            return JsonValue::Number(v.0.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return float_value(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return float_value(v as f64);
        }
        JsonValue::Null
    }

    fn decode_binary(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| decode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<JsonValue>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }

    fn decode_temporal(row: &PgRow, idx: usize) -> JsonValue {
        use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

        if let Ok(Some(v)) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return JsonValue::String(v.to_rfc3339());
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        JsonValue::Null
    }

    fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_interval(row: &PgRow, idx: usize) -> JsonValue {
        use sqlx::postgres::types::PgInterval;

        match row.try_get::<Option<PgInterval>, _>(idx) {
            Ok(Some(v)) => serde_json::json!({
                "months": v.months,
                "days": v.days,
                "microseconds": v.microseconds,
            }),
            Ok(None) => JsonValue::Null,
            Err(_) => decode_unknown(row, idx),
        }
    }

    /// Types without a Rust mapping (uuid, point, arrays, ...): the wire
    /// text when sent as text, otherwise the raw bytes.
    fn decode_unknown(row: &PgRow, idx: usize) -> JsonValue {
        use sqlx::ValueRef;

        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
            return JsonValue::String(v);
        }
        match row.try_get_raw(idx) {
            Ok(value) if value.is_null() => JsonValue::Null,
            Ok(value) => match value.as_str() {
                Ok(text) => JsonValue::String(text.to_string()),
                Err(_) => value
                    .as_bytes()
                    .map(decode_binary_value)
                    .unwrap_or(JsonValue::Null),
            },
            Err(_) => JsonValue::Null,
        }
    }
}

/// Oracle values.
///
/// Columns are classified from the `OracleType` display name (`NUMBER(10,2)`,
/// `TIMESTAMP(6) WITH TIME ZONE`, ...). Anything without a closer mapping
/// goes through Oracle's own string conversion.
pub mod oracle {
    use super::*;
    use ::oracle::sql_type::OracleType;
    use ::oracle::{Row, SqlValue};

    /// Column names and categories of a result set.
    pub fn column_layout(columns: &[::oracle::ColumnInfo]) -> Vec<(String, TypeCategory, bool)> {
        columns
            .iter()
            .map(|col| {
                let oracle_type = col.oracle_type();
                let with_zone = matches!(
                    oracle_type,
                    OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_)
                );
                let category = categorize_type(&oracle_type.to_string(), Dialect::Oracle);
                (col.name().to_string(), category, with_zone)
            })
            .collect()
    }

    pub fn row_to_json(
        layout: &[(String, TypeCategory, bool)],
        row: &Row,
    ) -> serde_json::Map<String, JsonValue> {
        layout
            .iter()
            .zip(row.sql_values())
            .map(|((name, category, with_zone), value)| {
                (name.clone(), decode_value(value, *category, *with_zone))
            })
            .collect()
    }

    pub fn decode_value(value: &SqlValue, category: TypeCategory, with_zone: bool) -> JsonValue {
        if value.is_null().unwrap_or(true) {
            return JsonValue::Null;
        }
        match category {
            TypeCategory::Decimal => decode_number(value),
            TypeCategory::Integer => value
                .get::<i64>()
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or_else(|_| decode_text(value)),
            TypeCategory::Float => value
                .get::<f64>()
                .map(float_value)
                .unwrap_or_else(|_| decode_text(value)),
            TypeCategory::Boolean => value
                .get::<bool>()
                .map(JsonValue::Bool)
                .unwrap_or_else(|_| decode_text(value)),
            TypeCategory::Binary => value
                .get::<Vec<u8>>()
                .map(|v| decode_binary_value(&v))
                .unwrap_or(JsonValue::Null),
            TypeCategory::Json => {
                let text = decode_text(value);
                match &text {
                    JsonValue::String(s) => serde_json::from_str(s).unwrap_or(text),
                    _ => text,
                }
            }
            TypeCategory::Temporal => decode_temporal(value, with_zone),
            TypeCategory::Text | TypeCategory::Interval | TypeCategory::Unknown => {
                decode_text(value)
            }
        }
    }

    /// NUMBER is exact: integral values become JSON integers, the rest keep
    /// the server's text like DECIMAL does elsewhere.
    fn decode_number(value: &SqlValue) -> JsonValue {
        match value.get::<String>() {
            Ok(text) => text
                .parse::<i64>()
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::String(text)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode NUMBER");
                JsonValue::Null
            }
        }
    }

    fn decode_temporal(value: &SqlValue, with_zone: bool) -> JsonValue {
        use chrono::{DateTime, FixedOffset, NaiveDateTime};

        if with_zone {
            if let Ok(v) = value.get::<DateTime<FixedOffset>>() {
                return JsonValue::String(v.to_rfc3339());
            }
        }
        if let Ok(v) = value.get::<NaiveDateTime>() {
            return JsonValue::String(v.to_string());
        }
        decode_text(value)
    }

    fn decode_text(value: &SqlValue) -> JsonValue {
        value
            .get::<String>()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(categorize_type("INT", Dialect::MySql), TypeCategory::Integer);
        assert_eq!(
            categorize_type("BIGINT UNSIGNED", Dialect::MySql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INT4", Dialect::PostgreSql),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal_before_float() {
        assert_eq!(
            categorize_type("DECIMAL", Dialect::MySql),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", Dialect::PostgreSql),
            TypeCategory::Decimal
        );
    }

    #[test]
    fn test_categorize_type_misc() {
        assert_eq!(
            categorize_type("BOOLEAN", Dialect::MySql),
            TypeCategory::Boolean
        );
        assert_eq!(
            categorize_type("jsonb", Dialect::PostgreSql),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", Dialect::PostgreSql),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("DATETIME", Dialect::MySql),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("VARBINARY", Dialect::MySql),
            TypeCategory::Binary
        );
        assert_eq!(categorize_type("NAME", Dialect::PostgreSql), TypeCategory::Text);
        assert_eq!(
            categorize_type("VARCHAR", Dialect::MySql),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("UUID", Dialect::PostgreSql),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_type_interval_and_point_not_integer() {
        assert_eq!(
            categorize_type("INTERVAL", Dialect::PostgreSql),
            TypeCategory::Interval
        );
        assert_eq!(
            categorize_type("POINT", Dialect::PostgreSql),
            TypeCategory::Unknown
        );
        assert_eq!(categorize_type("POINT", Dialect::MySql), TypeCategory::Binary);
        assert_eq!(
            categorize_type("MULTIPOINT", Dialect::MySql),
            TypeCategory::Binary
        );
        assert_eq!(
            categorize_type("INT4[]", Dialect::PostgreSql),
            TypeCategory::Unknown
        );
        assert_eq!(categorize_type("OID", Dialect::PostgreSql), TypeCategory::Integer);
        assert_eq!(
            categorize_type("SERIAL8", Dialect::PostgreSql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("MEDIUMINT UNSIGNED ZEROFILL", Dialect::MySql),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_oracle_type_names() {
        let oracle = |name| categorize_type(name, Dialect::Oracle);
        assert_eq!(oracle("NUMBER(10)"), TypeCategory::Decimal);
        assert_eq!(oracle("NUMBER(10,2)"), TypeCategory::Decimal);
        assert_eq!(oracle("NUMBER"), TypeCategory::Decimal);
        assert_eq!(oracle("FLOAT(126)"), TypeCategory::Float);
        assert_eq!(oracle("BINARY_DOUBLE"), TypeCategory::Float);
        assert_eq!(oracle("VARCHAR2(20)"), TypeCategory::Text);
        assert_eq!(oracle("NVARCHAR2(20)"), TypeCategory::Text);
        assert_eq!(oracle("CLOB"), TypeCategory::Text);
        assert_eq!(oracle("DATE"), TypeCategory::Temporal);
        assert_eq!(oracle("TIMESTAMP(6) WITH TIME ZONE"), TypeCategory::Temporal);
        assert_eq!(oracle("INTERVAL DAY(2) TO SECOND(6)"), TypeCategory::Interval);
        assert_eq!(oracle("RAW(16)"), TypeCategory::Binary);
        assert_eq!(oracle("LONG RAW"), TypeCategory::Binary);
        assert_eq!(oracle("BLOB"), TypeCategory::Binary);
        assert_eq!(oracle("ROWID"), TypeCategory::Unknown);
    }

    #[test]
    fn test_base_type_name() {
        assert_eq!(base_type_name("NUMBER(10,2)"), "number");
        assert_eq!(
            base_type_name("TIMESTAMP(6) WITH TIME ZONE"),
            "timestamp with time zone"
        );
        assert_eq!(base_type_name("BIGINT UNSIGNED"), "bigint");
        assert_eq!(base_type_name("double  precision"), "double precision");
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(
            decode_binary_value(b"world"),
            JsonValue::String("world".to_string())
        );
        assert_eq!(
            decode_binary_value(&[0xFF, 0xFE, 0x00, 0x01]),
            JsonValue::String("//4AAQ==".to_string())
        );
        assert_eq!(decode_binary_value(&[]), JsonValue::String(String::new()));
    }

    #[test]
    fn test_float_value_non_finite() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), JsonValue::String("NaN".to_string()));
    }
}
