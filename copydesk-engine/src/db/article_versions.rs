//! Article version snapshots
//!
//! Versions are append-only: written once on every substantive content change,
//! never updated. The newest snapshot for an article is its current content's
//! provenance record.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{ArticleVersion, VersionSource};

/// Append a version snapshot
pub async fn save_version(pool: &SqlitePool, version: &ArticleVersion) -> Result<()> {
    sqlx::query(
        "INSERT INTO article_versions (id, article_id, content, source, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(version.id.to_string())
    .bind(version.article_id.to_string())
    .bind(&version.content)
    .bind(version.source.as_str())
    .bind(version.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// All snapshots for an article, oldest first
pub async fn load_versions(pool: &SqlitePool, article_id: Uuid) -> Result<Vec<ArticleVersion>> {
    let rows = sqlx::query(
        "SELECT * FROM article_versions WHERE article_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(article_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_version).collect()
}

/// Most recent snapshot for an article
pub async fn load_latest_version(pool: &SqlitePool, article_id: Uuid) -> Result<Option<ArticleVersion>> {
    let row = sqlx::query(
        "SELECT * FROM article_versions WHERE article_id = ?
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(article_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(row_to_version).transpose()
}

fn row_to_version(row: sqlx::sqlite::SqliteRow) -> Result<ArticleVersion> {
    let id_str: String = row.get("id");
    let article_id_str: String = row.get("article_id");
    let source_str: String = row.get("source");
    let created_at: String = row.get("created_at");

    Ok(ArticleVersion {
        id: Uuid::parse_str(&id_str)?,
        article_id: Uuid::parse_str(&article_id_str)?,
        content: row.get("content"),
        source: VersionSource::from_str(&source_str).map_err(anyhow::Error::msg)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
    })
}
