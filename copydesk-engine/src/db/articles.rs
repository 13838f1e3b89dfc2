//! Article persistence
//!
//! Writes are last-writer-wins at the row level; the UNIQUE index on
//! `normalized_title` is the store-side backstop against the duplicate-title
//! check-then-insert race.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Article, ArticleStatus, RiskLevel};
use crate::utils::html::normalize_title;

/// An internal-link catalog entry offered to the link-insertion service
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
}

/// Insert a new article
///
/// Fails on a normalized-title collision (UNIQUE index); callers treat that as
/// a duplicate rejection, not an internal error.
pub async fn insert_article(pool: &SqlitePool, article: &Article) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO articles (id, title, normalized_title, content, excerpt,
                              target_keywords, word_count, status, quality_score,
                              quality_issues, risk_level, auto_publish_deadline,
                              contributor_id, published_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(article.id.to_string())
    .bind(&article.title)
    .bind(normalize_title(&article.title))
    .bind(&article.content)
    .bind(&article.excerpt)
    .bind(serde_json::to_string(&article.target_keywords)?)
    .bind(article.word_count)
    .bind(article.status.as_str())
    .bind(article.quality_score)
    .bind(serde_json::to_string(&article.quality_issues)?)
    .bind(article.risk_level.as_str())
    .bind(article.auto_publish_deadline.map(|d| d.to_rfc3339()))
    .bind(article.contributor_id.map(|id| id.to_string()))
    .bind(&article.published_url)
    .bind(article.created_at.to_rfc3339())
    .bind(article.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Update an article's content and word count (latest version wins)
pub async fn update_content(pool: &SqlitePool, id: Uuid, content: &str, word_count: i64) -> Result<()> {
    sqlx::query("UPDATE articles SET content = ?, word_count = ?, updated_at = ? WHERE id = ?")
        .bind(content)
        .bind(word_count)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Update an article's status
pub async fn update_status(pool: &SqlitePool, id: Uuid, status: ArticleStatus) -> Result<()> {
    sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Record the latest quality snapshot and derived risk level
pub async fn update_quality(
    pool: &SqlitePool,
    id: Uuid,
    score: i64,
    issues: &[String],
    risk_level: RiskLevel,
) -> Result<()> {
    sqlx::query(
        "UPDATE articles SET quality_score = ?, quality_issues = ?, risk_level = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(score)
    .bind(serde_json::to_string(issues)?)
    .bind(risk_level.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Approve an article and stamp its auto-publish deadline
pub async fn approve(pool: &SqlitePool, id: Uuid, deadline: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE articles SET status = 'approved', auto_publish_deadline = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(deadline.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark an article published with its live URL
pub async fn mark_published(pool: &SqlitePool, id: Uuid, published_url: &str) -> Result<()> {
    sqlx::query(
        "UPDATE articles SET status = 'published', published_url = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(published_url)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load one article by id
pub async fn load_article(pool: &SqlitePool, id: Uuid) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(row_to_article).transpose()
}

/// Exact normalized-title lookup (pre-persist duplicate re-check)
pub async fn load_by_normalized_title(pool: &SqlitePool, title: &str) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM articles WHERE normalized_title = ?")
        .bind(normalize_title(title))
        .fetch_optional(pool)
        .await?;
    row.map(row_to_article).transpose()
}

/// All article titles (duplicate comparison set)
pub async fn load_all_titles(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT title FROM articles")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}

/// Articles in a given status
pub async fn load_by_status(pool: &SqlitePool, status: ArticleStatus) -> Result<Vec<Article>> {
    let rows = sqlx::query("SELECT * FROM articles WHERE status = ? ORDER BY created_at ASC")
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(row_to_article).collect()
}

/// Count of articles in generation-in-progress states (draft, in_review)
pub async fn count_in_progress(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM articles WHERE status IN ('draft', 'in_review')",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Published articles as link-catalog entries for the link-insertion service
pub async fn load_link_catalog(pool: &SqlitePool) -> Result<Vec<CatalogEntry>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT title, published_url FROM articles
         WHERE status = 'published' AND published_url IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(title, url)| CatalogEntry { title, url })
        .collect())
}

fn row_to_article(row: sqlx::sqlite::SqliteRow) -> Result<Article> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");
    let risk_str: String = row.get("risk_level");
    let keywords_json: String = row.get("target_keywords");
    let issues_json: String = row.get("quality_issues");
    let deadline: Option<String> = row.get("auto_publish_deadline");
    let contributor_id: Option<String> = row.get("contributor_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Article {
        id: Uuid::parse_str(&id_str)?,
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        target_keywords: serde_json::from_str(&keywords_json)?,
        word_count: row.get("word_count"),
        status: ArticleStatus::from_str(&status_str).map_err(anyhow::Error::msg)?,
        quality_score: row.get("quality_score"),
        quality_issues: serde_json::from_str(&issues_json)?,
        risk_level: RiskLevel::from_str(&risk_str).map_err(anyhow::Error::msg)?,
        auto_publish_deadline: deadline
            .map(|d| DateTime::parse_from_rfc3339(&d).map(|d| d.with_timezone(&Utc)))
            .transpose()?,
        contributor_id: contributor_id.map(|s| Uuid::parse_str(&s)).transpose()?,
        published_url: row.get("published_url"),
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn sample_article(title: &str) -> Article {
        let mut article = Article::new(
            title.to_string(),
            "<p>content</p>".to_string(),
            "excerpt".to_string(),
            vec!["kw".to_string()],
        );
        article.word_count = 2;
        article
    }

    #[tokio::test]
    async fn test_insert_and_load_roundtrip() {
        let pool = test_pool().await;
        let article = sample_article("CD ladder guide");
        insert_article(&pool, &article).await.unwrap();

        let loaded = load_article(&pool, article.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "CD ladder guide");
        assert_eq!(loaded.status, ArticleStatus::Draft);
        assert_eq!(loaded.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_normalized_title_uniqueness_backstop() {
        let pool = test_pool().await;
        insert_article(&pool, &sample_article("CD Ladder Guide")).await.unwrap();

        // Different punctuation/case, same normalized title
        let dup = sample_article("cd ladder, guide!");
        let result = insert_article(&pool, &dup).await;
        assert!(result.is_err(), "normalized-title collision must be rejected by the store");
    }

    #[tokio::test]
    async fn test_normalized_title_lookup() {
        let pool = test_pool().await;
        insert_article(&pool, &sample_article("Best HELOC Lenders")).await.unwrap();

        let found = load_by_normalized_title(&pool, "best heloc lenders!").await.unwrap();
        assert!(found.is_some());
        let missing = load_by_normalized_title(&pool, "something else").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_in_progress_count() {
        let pool = test_pool().await;
        let a = sample_article("Draft one");
        let b = sample_article("Draft two");
        insert_article(&pool, &a).await.unwrap();
        insert_article(&pool, &b).await.unwrap();
        update_status(&pool, b.id, ArticleStatus::InReview).await.unwrap();

        assert_eq!(count_in_progress(&pool).await.unwrap(), 2);

        update_status(&pool, a.id, ArticleStatus::Approved).await.unwrap();
        assert_eq!(count_in_progress(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_publish_flow_and_catalog() {
        let pool = test_pool().await;
        let article = sample_article("Money market basics");
        insert_article(&pool, &article).await.unwrap();

        assert!(load_link_catalog(&pool).await.unwrap().is_empty());

        mark_published(&pool, article.id, "https://site.example/money-market").await.unwrap();

        let catalog = load_link_catalog(&pool).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].url, "https://site.example/money-market");

        let loaded = load_article(&pool, article.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ArticleStatus::Published);
    }

    #[tokio::test]
    async fn test_quality_snapshot_update() {
        let pool = test_pool().await;
        let article = sample_article("Quality test");
        insert_article(&pool, &article).await.unwrap();

        update_quality(&pool, article.id, 83, &["Add links".to_string()], RiskLevel::Low)
            .await
            .unwrap();

        let loaded = load_article(&pool, article.id).await.unwrap().unwrap();
        assert_eq!(loaded.quality_score, Some(83));
        assert_eq!(loaded.quality_issues, vec!["Add links".to_string()]);
        assert_eq!(loaded.risk_level, RiskLevel::Low);
    }
}
