//! `MockPool` — a test double for `QueryPool`.
//!
//! Records every statement it receives and answers from a queue of scripted
//! replies. Useful wherever a live Postgres is unavailable or irrelevant.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::executor::{QueryPool, Row};
use crate::value::DbValue;
use crate::DbError;

/// One statement seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// SQL with all whitespace runs collapsed to a single space.
    pub sql: String,
    pub params: Vec<DbValue>,
}

/// What the mock answers to the next statement.
pub enum MockReply {
    /// Return these rows (storage naming).
    Rows(Vec<Row>),
    /// Fail with a driver-level error carrying this message.
    Fail(String),
}

/// A pool that never touches a database.
///
/// Replies are consumed in call order; once the queue is empty every
/// statement returns no rows.
#[derive(Default)]
pub struct MockPool {
    /// All statements seen by this pool (in call order).
    pub calls: Mutex<Vec<RecordedQuery>>,
    replies: Mutex<VecDeque<MockReply>>,
    closes: AtomicUsize,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `rows` as the answer to the next unanswered statement.
    pub fn reply(self, rows: Vec<Row>) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Rows(rows));
        self
    }

    /// Queue a failure as the answer to the next unanswered statement.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Fail(message.into()));
        self
    }

    /// Number of statements executed so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Snapshot of every statement executed so far.
    pub fn recorded(&self) -> Vec<RecordedQuery> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of times `close` reached this pool.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryPool for MockPool {
    async fn query(&self, sql: &str, params: Vec<DbValue>) -> Result<Vec<Row>, DbError> {
        self.calls.lock().unwrap().push(RecordedQuery {
            sql: sql.split_whitespace().collect::<Vec<_>>().join(" "),
            params,
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Rows(rows)) => Ok(rows),
            Some(MockReply::Fail(message)) => Err(DbError::Sqlx(sqlx::Error::Protocol(message))),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn records_normalized_sql_and_params() {
        let pool = MockPool::new();
        pool.query("select *\n   from  t\n where \"id\"=$1", vec![DbValue::Int(1)])
            .await
            .unwrap();

        assert_eq!(
            pool.recorded(),
            vec![RecordedQuery {
                sql: r#"select * from t where "id"=$1"#.into(),
                params: vec![DbValue::Int(1)],
            }]
        );
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let pool = MockPool::new()
            .reply(vec![row(json!({ "n": 1 }))])
            .fail("boom");

        let first = pool.query("q1", Vec::new()).await.unwrap();
        assert_eq!(first[0]["n"], json!(1));

        let second = pool.query("q2", Vec::new()).await;
        assert!(matches!(second, Err(DbError::Sqlx(_))));

        let third = pool.query("q3", Vec::new()).await.unwrap();
        assert!(third.is_empty());
        assert_eq!(pool.call_count(), 3);
    }
}
