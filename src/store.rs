//! Archive storage abstraction.
//!
//! The [`ArchiveStore`] trait hands out one [`ArchiveConnection`] per request.
//! A connection runs a parameterized query and returns rows projected as
//! `(question, answer, question_id)`. Dropping a connection releases it, so a
//! request that is cancelled mid-query gives its connection back without any
//! extra bookkeeping.
//!
//! Implementations must be `Send + Sync` to be shared across request tasks.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::error::StoreError;
use crate::models::MatchedAnswer;

/// Source of per-request archive connections.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Acquire a connection scoped to a single request.
    async fn open(&self) -> Result<Box<dyn ArchiveConnection>, StoreError>;
}

/// A connection held for the duration of one request.
#[async_trait]
pub trait ArchiveConnection: Send {
    /// Run `sql` with `params` bound positionally (`?`), in order.
    ///
    /// The statement must select `question`, `answer` and `question_id`.
    async fn execute(
        &mut self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<MatchedAnswer>, StoreError>;

    /// Release the connection.
    fn close(self: Box<Self>);
}

/// SQLite implementation of [`ArchiveStore`] backed by a connection pool.
#[derive(Clone)]
pub struct SqliteArchive {
    pool: SqlitePool,
}

impl SqliteArchive {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArchiveStore for SqliteArchive {
    async fn open(&self) -> Result<Box<dyn ArchiveConnection>, StoreError> {
        let conn = self.pool.acquire().await.map_err(StoreError::Connect)?;
        Ok(Box::new(SqliteArchiveConnection { conn }))
    }
}

struct SqliteArchiveConnection {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl ArchiveConnection for SqliteArchiveConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<MatchedAnswer>, StoreError> {
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p);
        }
        let rows = query
            .fetch_all(&mut *self.conn)
            .await
            .map_err(StoreError::Query)?;

        rows.iter()
            .map(|row| -> Result<MatchedAnswer, sqlx::Error> {
                Ok(MatchedAnswer {
                    question: row.try_get("question")?,
                    answer: row.try_get("answer")?,
                    question_id: row.try_get("question_id")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::Query)
    }

    fn close(self: Box<Self>) {
        // Returning a PoolConnection to its pool happens on drop.
        drop(self);
    }
}
