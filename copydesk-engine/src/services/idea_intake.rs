//! Idea intake
//!
//! Every idea (manual entry or auto-suggestion) passes through similarity
//! dedup before it is persisted as pending. A near-duplicate is persisted as
//! `rejected` with the matched title recorded, never silently dropped.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use copydesk_common::events::{CopydeskEvent, EventBus};

use crate::db;
use crate::models::Idea;
use crate::services::similarity;

/// Intake request for a new idea
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub content_type: String,
    pub source_tag: String,
}

/// Intake decision
#[derive(Debug, Clone)]
pub enum IdeaAdmission {
    /// Persisted as pending
    Accepted(Idea),
    /// Persisted as rejected; the duplicate it collided with is recorded
    RejectedDuplicate {
        idea: Idea,
        matched_title: String,
        similarity: f64,
    },
}

/// Run dedup and persist the intake decision
pub async fn admit_idea(
    pool: &SqlitePool,
    event_bus: &EventBus,
    new_idea: NewIdea,
) -> Result<IdeaAdmission> {
    let threshold = db::settings::get_dedup_similarity_threshold(pool).await?;

    // Compare against live idea titles and every article title
    let mut existing = db::ideas::load_active_titles(pool).await?;
    existing.extend(db::articles::load_all_titles(pool).await?);

    let duplicate = similarity::find_near_duplicate(
        &new_idea.title,
        existing.iter().map(|s| s.as_str()),
        threshold,
    )
    .map(|(title, score)| (title.to_string(), score));

    let mut idea = Idea::new(
        new_idea.title,
        new_idea.description,
        new_idea.keywords,
        new_idea.content_type,
        new_idea.source_tag,
    );

    match duplicate {
        Some((matched_title, score)) => {
            idea.status = crate::models::IdeaStatus::Rejected;
            idea.rejection_reason = Some(format!("Duplicate of: {}", matched_title));
            db::ideas::save_idea(pool, &idea).await?;

            tracing::info!(
                idea_id = %idea.id,
                matched_title = %matched_title,
                similarity = score,
                "Idea rejected as near-duplicate"
            );

            event_bus.emit_lossy(CopydeskEvent::IdeaRejectedDuplicate {
                idea_id: idea.id,
                matched_title: matched_title.clone(),
                similarity: score,
                timestamp: Utc::now(),
            });

            Ok(IdeaAdmission::RejectedDuplicate {
                idea,
                matched_title,
                similarity: score,
            })
        }
        None => {
            db::ideas::save_idea(pool, &idea).await?;
            tracing::debug!(idea_id = %idea.id, title = %idea.title, "Idea accepted");
            Ok(IdeaAdmission::Accepted(idea))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::IdeaStatus;

    fn new_idea(title: &str) -> NewIdea {
        NewIdea {
            title: title.to_string(),
            description: "desc".to_string(),
            keywords: vec![],
            content_type: "guide".to_string(),
            source_tag: "manual".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_idea_accepted() {
        let pool = test_pool().await;
        let bus = EventBus::new(8);

        let admission = admit_idea(&pool, &bus, new_idea("Best HYSA rates")).await.unwrap();
        assert!(matches!(admission, IdeaAdmission::Accepted(_)));
        assert_eq!(db::ideas::count_pending(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_near_duplicate_rejected_and_persisted() {
        let pool = test_pool().await;
        let bus = EventBus::new(8);

        admit_idea(&pool, &bus, new_idea("Best savings accounts for 2025"))
            .await
            .unwrap();
        let admission = admit_idea(&pool, &bus, new_idea("Best savings account for 2025"))
            .await
            .unwrap();

        match admission {
            IdeaAdmission::RejectedDuplicate { idea, matched_title, similarity } => {
                assert_eq!(matched_title, "Best savings accounts for 2025");
                assert!(similarity > 0.70);
                let stored = db::ideas::load_idea(&pool, idea.id).await.unwrap().unwrap();
                assert_eq!(stored.status, IdeaStatus::Rejected);
                assert!(stored.rejection_reason.unwrap().contains("Duplicate of"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        // The duplicate never joins the pending queue
        assert_eq!(db::ideas::count_pending(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_against_article_title() {
        let pool = test_pool().await;
        let bus = EventBus::new(8);

        let article = crate::models::Article::new(
            "Mortgage refinance checklist".to_string(),
            "<p>c</p>".to_string(),
            String::new(),
            vec![],
        );
        db::articles::insert_article(&pool, &article).await.unwrap();

        let admission = admit_idea(&pool, &bus, new_idea("Mortgage refinance checklists"))
            .await
            .unwrap();
        assert!(matches!(admission, IdeaAdmission::RejectedDuplicate { .. }));
    }

    #[tokio::test]
    async fn test_distinct_idea_accepted_alongside_existing() {
        let pool = test_pool().await;
        let bus = EventBus::new(8);

        admit_idea(&pool, &bus, new_idea("Best savings accounts for 2025"))
            .await
            .unwrap();
        let admission = admit_idea(&pool, &bus, new_idea("How to dispute a credit report error"))
            .await
            .unwrap();
        assert!(matches!(admission, IdeaAdmission::Accepted(_)));
        assert_eq!(db::ideas::count_pending(&pool).await.unwrap(), 2);
    }
}
