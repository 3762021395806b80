//! Archive import.
//!
//! Loads forum posts from a JSON-lines file, one post per line:
//!
//! ```json
//! {"id":"q1","question":"When is the midterm?","answer":"Week 6.","answer_type":2,"unique_views":140,"total_no_upvotes":12,"keywords":["midterm","exam"]}
//! ```
//!
//! Posts are upserted by `id`; a post's keyword set is replaced on each
//! import. Each post is written in its own transaction.

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::lookup::fold_keyword;
use crate::migrate;

#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub answer_type: i64,
    #[serde(default)]
    pub unique_views: i64,
    #[serde(default)]
    pub total_no_upvotes: i64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub posts: usize,
    pub keywords: usize,
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let records = parse_records(&content)?;

    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    let stats = import_posts(&pool, &records).await?;
    pool.close().await;

    println!("Import {}", path.display());
    println!("  posts upserted: {}", stats.posts);
    println!("  keywords indexed: {}", stats.keywords);
    println!("ok");
    Ok(())
}

/// Parses JSON lines, skipping blank lines. Errors name the offending line.
pub fn parse_records(content: &str) -> Result<Vec<PostRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<PostRecord>(line)
                .with_context(|| format!("invalid post on line {}", i + 1))
        })
        .collect()
}

pub async fn import_posts(pool: &SqlitePool, records: &[PostRecord]) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    for rec in records {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO ForumPosts (id, question, answer, answer_type, unique_views, total_no_upvotes)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                answer_type = excluded.answer_type,
                unique_views = excluded.unique_views,
                total_no_upvotes = excluded.total_no_upvotes
            "#,
        )
        .bind(&rec.id)
        .bind(&rec.question)
        .bind(&rec.answer)
        .bind(rec.answer_type)
        .bind(rec.unique_views)
        .bind(rec.total_no_upvotes)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM ForumKeywords WHERE question_id = ?")
            .bind(&rec.id)
            .execute(&mut *tx)
            .await?;

        for kw in rec.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO ForumKeywords (keyword, keyword_folded, question_id) VALUES (?, ?, ?)",
            )
            .bind(kw)
            .bind(fold_keyword(kw))
            .bind(&rec.id)
            .execute(&mut *tx)
            .await?;
            stats.keywords += inserted.rows_affected() as usize;
        }

        tx.commit().await?;
        stats.posts += 1;
    }
    Ok(stats)
}
