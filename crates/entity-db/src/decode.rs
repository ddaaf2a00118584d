//! Postgres rows → JSON objects.
//!
//! The client never knows column types up front, so every returned row is
//! decoded by looking at each column's reported type name.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use sqlx::postgres::types::{Oid, PgInterval};
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind};
use sqlx::{Column, Row as _, TypeInfo};
use uuid::Uuid;

use crate::{DbError, Row};

/// Decode every row, keeping storage column names as keys.
pub(crate) fn decode_rows(rows: Vec<PgRow>) -> Result<Vec<Row>, DbError> {
    rows.iter().map(decode_row).collect()
}

fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, i, column.type_info())?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn decode_column(row: &PgRow, i: usize, type_info: &PgTypeInfo) -> Result<JsonValue, DbError> {
    let value = match type_info.name() {
        "BOOL" => json!(row.try_get::<Option<bool>, _>(i)?),
        "INT2" => json!(row.try_get::<Option<i16>, _>(i)?),
        "INT4" => json!(row.try_get::<Option<i32>, _>(i)?),
        "INT8" => json!(row.try_get::<Option<i64>, _>(i)?),
        "OID" => json!(row.try_get::<Option<Oid>, _>(i)?.map(|oid| oid.0)),
        "FLOAT4" => json!(row.try_get::<Option<f32>, _>(i)?),
        "FLOAT8" => json!(row.try_get::<Option<f64>, _>(i)?),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(i)?
            .map_or(JsonValue::Null, decimal_to_json),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "CITEXT" => {
            json!(row.try_get::<Option<String>, _>(i)?)
        }
        "BYTEA" => json!(row.try_get::<Option<Vec<u8>>, _>(i)?.map(|b| bytea_to_hex(&b))),
        "UUID" => json!(row.try_get::<Option<Uuid>, _>(i)?),
        "TIMESTAMPTZ" => json!(row.try_get::<Option<DateTime<Utc>>, _>(i)?),
        "TIMESTAMP" => json!(row.try_get::<Option<NaiveDateTime>, _>(i)?),
        "DATE" => json!(row.try_get::<Option<NaiveDate>, _>(i)?),
        "TIME" => json!(row.try_get::<Option<NaiveTime>, _>(i)?),
        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(i)?
            .map_or(JsonValue::Null, |v| {
                json!({ "months": v.months, "days": v.days, "microseconds": v.microseconds })
            }),
        "JSON" | "JSONB" => row
            .try_get::<Option<JsonValue>, _>(i)?
            .unwrap_or(JsonValue::Null),

        // arrays keep null elements
        "BOOL[]" => json!(row.try_get::<Option<Vec<Option<bool>>>, _>(i)?),
        "INT2[]" => json!(row.try_get::<Option<Vec<Option<i16>>>, _>(i)?),
        "INT4[]" => json!(row.try_get::<Option<Vec<Option<i32>>>, _>(i)?),
        "INT8[]" => json!(row.try_get::<Option<Vec<Option<i64>>>, _>(i)?),
        "FLOAT4[]" => json!(row.try_get::<Option<Vec<Option<f32>>>, _>(i)?),
        "FLOAT8[]" => json!(row.try_get::<Option<Vec<Option<f64>>>, _>(i)?),
        "NUMERIC[]" => row
            .try_get::<Option<Vec<Option<Decimal>>>, _>(i)?
            .map_or(JsonValue::Null, |items| {
                items
                    .into_iter()
                    .map(|d| d.map_or(JsonValue::Null, decimal_to_json))
                    .collect()
            }),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            json!(row.try_get::<Option<Vec<Option<String>>>, _>(i)?)
        }
        "UUID[]" => json!(row.try_get::<Option<Vec<Option<Uuid>>>, _>(i)?),
        "TIMESTAMPTZ[]" => json!(row.try_get::<Option<Vec<Option<DateTime<Utc>>>>, _>(i)?),
        "JSONB[]" => json!(row.try_get::<Option<Vec<Option<JsonValue>>>, _>(i)?),

        other => match type_info.kind() {
            // enum values travel as their label
            PgTypeKind::Enum(_) => json!(row.try_get_unchecked::<Option<String>, _>(i)?),
            _ => return Err(DbError::UnsupportedDatatype(other.to_string())),
        },
    };
    Ok(value)
}

/// A JSON number when the value fits an `f64`, its decimal text otherwise.
fn decimal_to_json(value: Decimal) -> JsonValue {
    value
        .to_f64()
        .map_or_else(|| JsonValue::String(value.to_string()), |f| json!(f))
}

/// Postgres' own hex output form, e.g. `\xdeadbeef`.
fn bytea_to_hex(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("\\x{hex}")
}
