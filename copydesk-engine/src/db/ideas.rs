//! Idea persistence

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Idea, IdeaStatus};

/// Save an idea (upsert by id)
pub async fn save_idea(pool: &SqlitePool, idea: &Idea) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ideas (id, title, description, keywords, content_type, priority,
                           status, source_tag, rejection_reason, article_id,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            keywords = excluded.keywords,
            content_type = excluded.content_type,
            priority = excluded.priority,
            status = excluded.status,
            source_tag = excluded.source_tag,
            rejection_reason = excluded.rejection_reason,
            article_id = excluded.article_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(idea.id.to_string())
    .bind(&idea.title)
    .bind(&idea.description)
    .bind(serde_json::to_string(&idea.keywords)?)
    .bind(&idea.content_type)
    .bind(idea.priority)
    .bind(idea.status.as_str())
    .bind(&idea.source_tag)
    .bind(&idea.rejection_reason)
    .bind(idea.article_id.map(|id| id.to_string()))
    .bind(idea.created_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a single idea by id
pub async fn load_idea(pool: &SqlitePool, id: Uuid) -> Result<Option<Idea>> {
    let row = sqlx::query("SELECT * FROM ideas WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_idea).transpose()
}

/// Pending ideas, highest priority first, oldest first within a priority
pub async fn load_pending_ideas(pool: &SqlitePool, limit: i64) -> Result<Vec<Idea>> {
    let rows = sqlx::query(
        "SELECT * FROM ideas WHERE status = 'pending'
         ORDER BY priority DESC, created_at ASC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_idea).collect()
}

/// Number of ideas still waiting for generation
pub async fn count_pending(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ideas WHERE status = 'pending'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Titles of all non-rejected ideas (intake duplicate comparison set)
pub async fn load_active_titles(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT title FROM ideas WHERE status != 'rejected'")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}

/// Reject an idea, recording the reason (e.g. the duplicate title matched)
pub async fn mark_rejected(pool: &SqlitePool, id: Uuid, reason: &str) -> Result<()> {
    sqlx::query(
        "UPDATE ideas SET status = 'rejected', rejection_reason = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(reason)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Complete an idea, linking the generated article
pub async fn mark_completed(pool: &SqlitePool, id: Uuid, article_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE ideas SET status = 'completed', article_id = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(article_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_idea(row: sqlx::sqlite::SqliteRow) -> Result<Idea> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");
    let keywords_json: String = row.get("keywords");
    let article_id: Option<String> = row.get("article_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Idea {
        id: Uuid::parse_str(&id_str)?,
        title: row.get("title"),
        description: row.get("description"),
        keywords: serde_json::from_str(&keywords_json)?,
        content_type: row.get("content_type"),
        priority: row.get("priority"),
        status: IdeaStatus::from_str(&status_str).map_err(anyhow::Error::msg)?,
        source_tag: row.get("source_tag"),
        rejection_reason: row.get("rejection_reason"),
        article_id: article_id.map(|s| Uuid::parse_str(&s)).transpose()?,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc),
    })
}
