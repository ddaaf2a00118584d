//! Values that may be bound as query parameters.
//!
//! `DbValue` is a closed set: anything the storage layer cannot accept has no
//! variant and so cannot reach a statement.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgTypeInfo, Postgres};
use sqlx::query::Query;
use sqlx::Type;
use uuid::Uuid;

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    /// Explicit SQL `NULL`. Distinct from an absent field, which is never
    /// written at all.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    /// Bound as `jsonb`.
    Json(JsonValue),
}

impl DbValue {
    /// Wrap any JSON value for a `json`/`jsonb` column, scalars included.
    pub fn json(value: impl Into<JsonValue>) -> Self {
        Self::Json(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for DbValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for DbValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for DbValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for DbValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// `None` becomes an explicit `NULL`.
impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// JSON scalars map onto the matching scalar variant; arrays and objects
/// become [`DbValue::Json`].
impl From<JsonValue> for DbValue {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Self::Text(s),
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => Self::Json(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// A `NULL` sent with an unspecified parameter type so the server infers it
/// from the target column, whatever that column's type is.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q> Encode<'q, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Text sent with an unspecified parameter type. The server infers the type
/// from context, so strings can be written to enum and domain columns and
/// fall back to `text` where nothing constrains them.
struct UntypedText(String);

impl Type<Postgres> for UntypedText {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q> Encode<'q, Postgres> for UntypedText {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        buf.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }
}

/// Bind one value onto a Postgres query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: DbValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        DbValue::Null => query.bind(UntypedNull),
        DbValue::Bool(v) => query.bind(v),
        DbValue::Int(v) => query.bind(v),
        DbValue::Float(v) => query.bind(v),
        DbValue::Text(v) => query.bind(UntypedText(v)),
        DbValue::Uuid(v) => query.bind(v),
        DbValue::Timestamp(v) => query.bind(v),
        DbValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}
