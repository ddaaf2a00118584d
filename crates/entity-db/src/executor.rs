//! The query primitive every client runs through.
//!
//! [`QueryPool`] is the seam between the entity client and the driver. The
//! production implementation is sqlx's [`PgPool`]; tests use
//! [`MockPool`](crate::mock::MockPool).

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;
use tracing::debug;

use crate::decode::decode_rows;
use crate::value::{bind_value, DbValue};
use crate::DbError;

/// One returned row, column name → value.
pub type Row = Map<String, JsonValue>;

/// A shared pool that can run parameterized statements.
#[async_trait]
pub trait QueryPool: Send + Sync + 'static {
    /// Run `sql` with positional `params` (`$1`, `$2`, …) and return every
    /// row it produced, keys in storage naming.
    async fn query(&self, sql: &str, params: Vec<DbValue>) -> Result<Vec<Row>, DbError>;

    /// Release the pool's connections.
    async fn close(&self);
}

#[async_trait]
impl QueryPool for PgPool {
    async fn query(&self, sql: &str, params: Vec<DbValue>) -> Result<Vec<Row>, DbError> {
        debug!(params = params.len(), "executing: {}", sql.trim());

        // Statements are built per call and their parameter types vary with the
        // entity, so they are not cached server-side.
        let mut q = sqlx::query(sql).persistent(false);
        for value in params {
            q = bind_value(q, value);
        }
        let rows = q.fetch_all(self).await?;
        decode_rows(rows)
    }

    async fn close(&self) {
        PgPool::close(self).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use sqlx::postgres::PgPoolOptions;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p entity-db -- --ignored

    async fn live_pool() -> PgPool {
        let config = PoolConfig::from_env().expect("DATABASE_URL required");
        PgPoolOptions::new()
            .max_connections(2)
            .connect_with(config.connect_options().expect("valid url"))
            .await
            .expect("pool creation failed")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn binds_positional_params() {
        let pool = live_pool().await;
        let rows = QueryPool::query(
            &pool,
            "SELECT $1::int AS n, $2::text AS s",
            vec![DbValue::Int(7), DbValue::Text("seven".into())],
        )
        .await
        .expect("query failed");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], serde_json::json!(7));
        assert_eq!(rows[0]["s"], serde_json::json!("seven"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn untyped_null_takes_the_column_type() {
        let pool = live_pool().await;
        let rows = QueryPool::query(
            &pool,
            "SELECT $1::int8 IS NULL AS was_null",
            vec![DbValue::Null],
        )
        .await
        .expect("query failed");

        assert_eq!(rows[0]["was_null"], serde_json::json!(true));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn text_params_take_the_type_of_their_context() {
        let pool = live_pool().await;
        let rows = QueryPool::query(
            &pool,
            "SELECT $1 AS free, $2::varchar(8) AS bounded, $3 = 'x'::name AS same",
            vec![
                DbValue::Text("free".into()),
                DbValue::Text("bounded".into()),
                DbValue::Text("x".into()),
            ],
        )
        .await
        .expect("query failed");

        assert_eq!(rows[0]["free"], serde_json::json!("free"));
        assert_eq!(rows[0]["bounded"], serde_json::json!("bounded"));
        assert_eq!(rows[0]["same"], serde_json::json!(true));
    }
}
