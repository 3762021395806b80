//! Ranked keyword lookup against the archive.
//!
//! Every keyword is matched as a case-insensitive substring of the indexed
//! keyword text, and matches are OR-combined. Case folding is Unicode
//! lowercasing done in Rust on both sides ([`fold_keyword`]): at import into
//! `ForumKeywords.keyword_folded`, and here on the bound keywords. A post is returned at most once
//! even when several of its keywords match. Results are ordered by answer
//! type, then unique views, then upvotes, all descending. Rows that tie on all
//! three come back in whatever order SQLite produces.
//!
//! Keywords are always bound as parameters.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::classify::{classify, REQ_DEMO, REQ_GET_FAQS};
use crate::config::Config;
use crate::db;
use crate::error::StoreError;
use crate::models::{ClassifiedRequest, IncomingParameters, MatchedAnswer};
use crate::store::{ArchiveStore, SqliteArchive};

/// CLI lookup: classifies the arguments as a browser request would be,
/// then prints the ranked matches.
pub async fn run_lookup(
    config: &Config,
    keywords: &[String],
    uid: Option<String>,
    demo: bool,
) -> Result<()> {
    let mut params = IncomingParameters::new();
    params.push("req", if demo { REQ_DEMO } else { REQ_GET_FAQS });
    for k in keywords {
        params.push("keyword", k.as_str());
    }
    if let Some(uid) = uid {
        params.push("uid", uid);
    }

    let request = match classify(&params) {
        ClassifiedRequest::Lookup(req) => req,
        ClassifiedRequest::Invalid { reason } => bail!("{}", reason),
        ClassifiedRequest::Feedback { .. } => bail!("not a lookup request"),
    };

    let pool = db::connect(config).await?;
    let service = FaqLookupService::new(
        Arc::new(SqliteArchive::new(pool.clone())),
        config.lookup.query_timeout(),
    );
    let rows = service.lookup(&request.keywords).await;
    pool.close().await;
    let rows = rows?;

    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (rank, row) in (1..).zip(&rows) {
        println!("{}. [{}]", rank, row.question_id);
        println!("    Q: {}", first_line(&row.question));
        println!("    A: {}", first_line(&row.answer));
        println!();
    }
    Ok(())
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim()
}

const SELECT_POSTS: &str = "SELECT p.question AS question, p.answer AS answer, p.id AS question_id
FROM ForumPosts p
JOIN (SELECT DISTINCT question_id FROM ForumKeywords WHERE ";

const ORDER_BY: &str = ") k ON k.question_id = p.id
ORDER BY p.answer_type DESC, p.unique_views DESC, p.total_no_upvotes DESC";

const KEYWORD_PREDICATE: &str = "instr(keyword_folded, ?) > 0";

/// Case folding shared by import and lookup. SQLite's `lower()` only folds
/// ASCII, so folding never happens in SQL.
pub fn fold_keyword(keyword: &str) -> String {
    keyword.to_lowercase()
}

/// Builds the ranked query and its positional parameters for `keywords`.
///
/// `keywords` must be non-empty.
pub fn build_query(keywords: &[String]) -> (String, Vec<String>) {
    let predicates = vec![KEYWORD_PREDICATE; keywords.len()].join(" OR ");
    let sql = format!("{SELECT_POSTS}{predicates}{ORDER_BY}");
    let params = keywords.iter().map(|k| fold_keyword(k)).collect();
    (sql, params)
}

#[derive(Clone)]
pub struct FaqLookupService {
    store: Arc<dyn ArchiveStore>,
    query_timeout: Duration,
}

impl FaqLookupService {
    pub fn new(store: Arc<dyn ArchiveStore>, query_timeout: Duration) -> Self {
        Self {
            store,
            query_timeout,
        }
    }

    /// Runs one ranked lookup on a connection acquired for this call only.
    ///
    /// The connection is released before returning, whatever the outcome.
    /// No partial results are returned on failure.
    pub async fn lookup(&self, keywords: &[String]) -> Result<Vec<MatchedAnswer>, StoreError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, params) = build_query(keywords);

        let mut conn = self.store.open().await?;
        let outcome = tokio::time::timeout(self.query_timeout, conn.execute(&sql, &params)).await;
        conn.close();

        match outcome {
            Ok(rows) => rows,
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::create_schema;
    use crate::store::{ArchiveConnection, SqliteArchive};
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn memory_pool() -> SqlitePool {
        // A single connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_post(
        pool: &SqlitePool,
        id: &str,
        keywords: &[&str],
        answer_type: i64,
        views: i64,
        upvotes: i64,
    ) {
        sqlx::query(
            "INSERT INTO ForumPosts (id, question, answer, answer_type, unique_views, total_no_upvotes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(format!("question {}", id))
        .bind(format!("answer {}", id))
        .bind(answer_type)
        .bind(views)
        .bind(upvotes)
        .execute(pool)
        .await
        .unwrap();
        for kw in keywords {
            sqlx::query(
                "INSERT INTO ForumKeywords (keyword, keyword_folded, question_id) VALUES (?, ?, ?)",
            )
            .bind(kw)
            .bind(fold_keyword(kw))
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    fn service(pool: SqlitePool) -> FaqLookupService {
        FaqLookupService::new(
            Arc::new(SqliteArchive::new(pool)),
            Duration::from_secs(5),
        )
    }

    fn ids(rows: &[MatchedAnswer]) -> Vec<&str> {
        rows.iter().map(|r| r.question_id.as_str()).collect()
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_build_query_one_placeholder_per_keyword() {
        let (sql, params) = build_query(&kw(&["a", "b", "c"]));
        assert_eq!(sql.matches('?').count(), 3);
        assert_eq!(params, vec!["a", "b", "c"]);
        assert!(sql.contains("ORDER BY p.answer_type DESC, p.unique_views DESC"));
    }

    #[test]
    fn test_build_query_folds_bound_keywords() {
        let (_, params) = build_query(&kw(&["Übung", "MIDTERM"]));
        assert_eq!(params, vec!["übung", "midterm"]);
    }

    #[test]
    fn test_build_query_never_embeds_keyword_text() {
        let (sql, _) = build_query(&kw(&["x' OR '1'='1"]));
        assert!(!sql.contains("'1'='1"));
    }

    #[tokio::test]
    async fn test_lookup_orders_by_type_views_upvotes() {
        let pool = memory_pool().await;
        insert_post(&pool, "low", &["midterm"], 0, 500, 50).await;
        insert_post(&pool, "top", &["midterm"], 2, 1, 0).await;
        insert_post(&pool, "mid_views", &["midterm"], 1, 100, 0).await;
        insert_post(&pool, "mid_upvotes", &["midterm"], 1, 100, 9).await;
        insert_post(&pool, "mid_low", &["midterm"], 1, 10, 99).await;

        let rows = service(pool).lookup(&kw(&["midterm"])).await.unwrap();
        assert_eq!(
            ids(&rows),
            vec!["top", "mid_upvotes", "mid_views", "mid_low", "low"]
        );
    }

    #[tokio::test]
    async fn test_lookup_substring_case_insensitive_for_every_keyword() {
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["Midterm exam"], 1, 0, 0).await;
        insert_post(&pool, "q2", &["homework"], 0, 0, 0).await;
        insert_post(&pool, "q3", &["office hours"], 0, 0, 0).await;

        let rows = service(pool)
            .lookup(&kw(&["MIDTERM", "work"]))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn test_lookup_folds_non_ascii_case() {
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["Übungsblatt"], 0, 0, 0).await;
        insert_post(&pool, "q2", &["ÉTUDE de cas"], 0, 0, 0).await;

        let svc = service(pool);
        for word in ["übung", "Übung", "ÜBUNGSBLATT"] {
            let rows = svc.lookup(&kw(&[word])).await.unwrap();
            assert_eq!(ids(&rows), vec!["q1"], "keyword {word}");
        }
        let rows = svc.lookup(&kw(&["étude"])).await.unwrap();
        assert_eq!(ids(&rows), vec!["q2"]);
    }

    #[tokio::test]
    async fn test_lookup_exact_ties_any_order() {
        let pool = memory_pool().await;
        insert_post(&pool, "first", &["exam"], 2, 0, 0).await;
        insert_post(&pool, "tie_a", &["exam"], 1, 50, 5).await;
        insert_post(&pool, "tie_b", &["exam"], 1, 50, 5).await;
        insert_post(&pool, "last", &["exam"], 0, 900, 90).await;

        let rows = service(pool).lookup(&kw(&["exam"])).await.unwrap();
        let ids = ids(&rows);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], "first");
        assert_eq!(ids[3], "last");
        // Rows equal on all three sort keys have no defined order between them
        let mut tied = ids[1..3].to_vec();
        tied.sort_unstable();
        assert_eq!(tied, vec!["tie_a", "tie_b"]);
    }

    #[tokio::test]
    async fn test_lookup_returns_each_post_once() {
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["exam", "final exam", "exam review"], 0, 0, 0).await;

        let rows = service(pool).lookup(&kw(&["exam", "review"])).await.unwrap();
        assert_eq!(ids(&rows), vec!["q1"]);
        assert_eq!(rows[0].question, "question q1");
        assert_eq!(rows[0].answer, "answer q1");
    }

    #[tokio::test]
    async fn test_lookup_quotes_are_matched_literally() {
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["it's due"], 0, 0, 0).await;
        insert_post(&pool, "q2", &["other"], 0, 0, 0).await;

        let svc = service(pool);
        let rows = svc.lookup(&kw(&["it's"])).await.unwrap();
        assert_eq!(ids(&rows), vec!["q1"]);

        let rows = svc.lookup(&kw(&["x' OR '1'='1"])).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_no_match_is_empty_not_error() {
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["exam"], 0, 0, 0).await;
        let rows = service(pool).lookup(&kw(&["zebra"])).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_releases_connection_for_next_request() {
        // With a single-connection pool a leaked connection would block forever
        let pool = memory_pool().await;
        insert_post(&pool, "q1", &["exam"], 0, 0, 0).await;
        let svc = service(pool);
        for _ in 0..3 {
            assert_eq!(svc.lookup(&kw(&["exam"])).await.unwrap().len(), 1);
        }
    }

    struct FailingStore {
        closed: Arc<AtomicUsize>,
    }

    struct FailingConn {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ArchiveStore for FailingStore {
        async fn open(&self) -> Result<Box<dyn ArchiveConnection>, StoreError> {
            Ok(Box::new(FailingConn {
                closed: self.closed.clone(),
            }))
        }
    }

    #[async_trait]
    impl ArchiveConnection for FailingConn {
        async fn execute(
            &mut self,
            _sql: &str,
            _params: &[String],
        ) -> Result<Vec<MatchedAnswer>, StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }

        fn close(self: Box<Self>) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_failed_query_still_closes_connection() {
        let closed = Arc::new(AtomicUsize::new(0));
        let svc = FaqLookupService::new(
            Arc::new(FailingStore {
                closed: closed.clone(),
            }),
            Duration::from_secs(1),
        );
        let err = svc.lookup(&kw(&["exam"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    struct HangingStore;
    struct HangingConn;

    #[async_trait]
    impl ArchiveStore for HangingStore {
        async fn open(&self) -> Result<Box<dyn ArchiveConnection>, StoreError> {
            Ok(Box::new(HangingConn))
        }
    }

    #[async_trait]
    impl ArchiveConnection for HangingConn {
        async fn execute(
            &mut self,
            _sql: &str,
            _params: &[String],
        ) -> Result<Vec<MatchedAnswer>, StoreError> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }

        fn close(self: Box<Self>) {}
    }

    #[tokio::test]
    async fn test_slow_query_times_out() {
        let svc = FaqLookupService::new(Arc::new(HangingStore), Duration::from_millis(20));
        let err = svc.lookup(&kw(&["exam"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }
}
