//! Idea intake endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::Idea;
use crate::services::idea_intake::{admit_idea, IdeaAdmission, NewIdea};
use crate::AppState;

/// POST /ideas - manual idea entry, deduplicated at intake
///
/// Near-duplicates are persisted as rejected and answered with 409 so the
/// caller sees exactly which title collided.
pub async fn submit_idea(
    State(state): State<AppState>,
    Json(new_idea): Json<NewIdea>,
) -> ApiResult<Json<Idea>> {
    if new_idea.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Idea title must not be empty".to_string()));
    }

    let admission = admit_idea(&state.db, &state.event_bus, new_idea)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match admission {
        IdeaAdmission::Accepted(idea) => Ok(Json(idea)),
        IdeaAdmission::RejectedDuplicate { matched_title, similarity, .. } => {
            Err(ApiError::Conflict(format!(
                "Near-duplicate of \"{}\" (similarity {:.2})",
                matched_title, similarity
            )))
        }
    }
}

/// Pending queue summary
#[derive(Debug, Serialize)]
pub struct IdeaQueueResponse {
    pub pending: Vec<Idea>,
    pub pending_count: i64,
}

/// GET /ideas/pending
pub async fn pending_ideas(State(state): State<AppState>) -> ApiResult<Json<IdeaQueueResponse>> {
    let pending = crate::db::ideas::load_pending_ideas(&state.db, 100)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let pending_count = crate::db::ideas::count_pending(&state.db)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(IdeaQueueResponse { pending, pending_count }))
}

/// Build idea routes
pub fn idea_routes() -> Router<AppState> {
    Router::new()
        .route("/ideas", post(submit_idea))
        .route("/ideas/pending", get(pending_ideas))
}
