//! Advisory revision validation endpoint
//!
//! Pairs before/after content with reviewer feedback and returns the
//! validator's report. Purely advisory: nothing here blocks a save; the
//! report is attached to the review surface for human attention.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::FeedbackItem;
use crate::validators::{RevisionReport, RevisionValidator};
use crate::AppState;

/// One feedback item as submitted by the review surface
#[derive(Debug, Deserialize)]
pub struct FeedbackItemRequest {
    pub category: String,
    pub severity: String,
    pub selected_text: Option<String>,
    pub comment: String,
}

/// Validation request: original and revised content plus the feedback items
#[derive(Debug, Deserialize)]
pub struct ValidateRevisionRequest {
    /// Original content; when omitted, the latest stored version of
    /// `article_id` is used
    pub original: Option<String>,
    pub article_id: Option<Uuid>,
    pub revised: String,
    pub feedback_items: Vec<FeedbackItemRequest>,
}

/// POST /revisions/validate
pub async fn validate_revision(
    State(state): State<AppState>,
    Json(request): Json<ValidateRevisionRequest>,
) -> ApiResult<Json<RevisionReport>> {
    let original = match (request.original, request.article_id) {
        (Some(original), _) => original,
        (None, Some(article_id)) => {
            crate::db::article_versions::load_latest_version(&state.db, article_id)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("no stored version for article {}", article_id))
                })?
                .content
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either original content or article_id is required".to_string(),
            ));
        }
    };

    let items: Vec<FeedbackItem> = request
        .feedback_items
        .into_iter()
        .map(|item| FeedbackItem::new(item.category, item.severity, item.selected_text, item.comment))
        .collect();

    let report = RevisionValidator::new().validate(&original, &request.revised, &items);
    Ok(Json(report))
}

/// Build revision routes
pub fn revision_routes() -> Router<AppState> {
    Router::new().route("/revisions/validate", post(validate_revision))
}
