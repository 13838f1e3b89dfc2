//! Article read endpoints

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Article, ArticleStatus, ArticleVersion, RiskLevel, VersionSource};
use crate::utils::html;
use crate::AppState;

/// Listing row: everything a dashboard needs except the body
#[derive(Debug, Serialize)]
pub struct ArticleBrief {
    pub id: Uuid,
    pub title: String,
    pub status: ArticleStatus,
    pub word_count: i64,
    pub quality_score: Option<i64>,
    pub risk_level: RiskLevel,
    pub published_url: Option<String>,
}

impl From<Article> for ArticleBrief {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            status: article.status,
            word_count: article.word_count,
            quality_score: article.quality_score,
            risk_level: article.risk_level,
            published_url: article.published_url,
        }
    }
}

/// GET /articles - briefs for every non-published pipeline state plus published
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<ArticleBrief>>> {
    let mut briefs = Vec::new();
    for status in [
        ArticleStatus::Draft,
        ArticleStatus::InReview,
        ArticleStatus::Refinement,
        ArticleStatus::QaReview,
        ArticleStatus::Approved,
        ArticleStatus::NeedsRevision,
        ArticleStatus::Published,
    ] {
        let articles = crate::db::articles::load_by_status(&state.db, status)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        briefs.extend(articles.into_iter().map(ArticleBrief::from));
    }
    Ok(Json(briefs))
}

/// GET /articles/:id - full article including content
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    let article = crate::db::articles::load_article(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("article {}", id)))?;
    Ok(Json(article))
}

/// Manual content edit
#[derive(Debug, Deserialize)]
pub struct EditContentRequest {
    pub content: String,
}

/// PUT /articles/:id/content - human edit; writes a manual_edit version snapshot
pub async fn edit_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditContentRequest>,
) -> ApiResult<Json<Article>> {
    let article = crate::db::articles::load_article(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("article {}", id)))?;

    let word_count = html::word_count(&request.content) as i64;
    crate::db::articles::update_content(&state.db, article.id, &request.content, word_count)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    crate::db::article_versions::save_version(
        &state.db,
        &ArticleVersion::new(article.id, request.content, VersionSource::ManualEdit),
    )
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let updated = crate::db::articles::load_article(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("article {}", id)))?;
    Ok(Json(updated))
}

/// Build article routes
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:id", get(get_article))
        .route("/articles/:id/content", put(edit_content))
}
