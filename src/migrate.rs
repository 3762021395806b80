use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the archive tables and indexes. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // One row per archived question with its accepted answer
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ForumPosts (
            id TEXT PRIMARY KEY,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            answer_type INTEGER NOT NULL DEFAULT 0,
            unique_views INTEGER NOT NULL DEFAULT 0,
            total_no_upvotes INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Keyword index: many keywords per post. `keyword_folded` holds the
    // Unicode-lowercased keyword that lookups match against.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ForumKeywords (
            keyword TEXT NOT NULL,
            keyword_folded TEXT NOT NULL,
            question_id TEXT NOT NULL,
            UNIQUE(keyword, question_id),
            FOREIGN KEY (question_id) REFERENCES ForumPosts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_forum_keywords_question_id ON ForumKeywords(question_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_forum_posts_rank
            ON ForumPosts(answer_type DESC, unique_views DESC, total_no_upvotes DESC)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
