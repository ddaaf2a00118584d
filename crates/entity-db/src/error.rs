//! Typed error type for the entity-db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A pool was requested from a provider that never had one created.
    #[error("create connection before using it")]
    UninitializedPool,

    /// Driver or storage failure, passed through untouched.
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A returned column has a Postgres type the row decoder cannot map.
    #[error("unsupported datatype: {0}")]
    UnsupportedDatatype(String),

    /// A returned row could not be deserialized into the entity type.
    #[error("cannot deserialize row: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A row came back without a column the operation relies on.
    #[error("column '{0}' missing from returned row")]
    MissingColumn(&'static str),

    /// An `insert`/`update ... returning *` came back empty, e.g. the matched
    /// row was deleted between lookup and update.
    #[error("{0} returned no row")]
    NoRowReturned(&'static str),
}
