//! Content idea lifecycle
//!
//! An idea enters the pipeline as `pending`, is rejected at intake when it
//! near-duplicates an existing title, and becomes `completed` once a generated
//! article has been persisted for it. A failed generation run leaves the idea
//! `pending` so the next automation cycle can retry it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Idea lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    /// Awaiting generation
    Pending,
    /// Manually approved for prioritized generation
    Approved,
    /// Rejected (duplicate or editorial decision)
    Rejected,
    /// Article generated and persisted
    Completed,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Pending => "pending",
            IdeaStatus::Approved => "approved",
            IdeaStatus::Rejected => "rejected",
            IdeaStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for IdeaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IdeaStatus::Pending),
            "approved" => Ok(IdeaStatus::Approved),
            "rejected" => Ok(IdeaStatus::Rejected),
            "completed" => Ok(IdeaStatus::Completed),
            other => Err(format!("Unknown idea status: {}", other)),
        }
    }
}

/// Candidate topic awaiting or having undergone content generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub content_type: String,
    pub priority: i64,
    pub status: IdeaStatus,
    /// Where the idea came from ("manual", "auto", import tags)
    pub source_tag: String,
    /// Populated when the idea is rejected (names the duplicate title)
    pub rejection_reason: Option<String>,
    /// Populated when the idea is completed (links the generated article)
    pub article_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Create a new pending idea
    pub fn new(
        title: String,
        description: String,
        keywords: Vec<String>,
        content_type: String,
        source_tag: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            keywords,
            content_type,
            priority: 0,
            status: IdeaStatus::Pending,
            source_tag,
            rejection_reason: None,
            article_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            IdeaStatus::Pending,
            IdeaStatus::Approved,
            IdeaStatus::Rejected,
            IdeaStatus::Completed,
        ] {
            assert_eq!(IdeaStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_new_idea_is_pending() {
        let idea = Idea::new(
            "Best savings accounts".to_string(),
            "Roundup of savings account rates".to_string(),
            vec!["savings".to_string()],
            "roundup".to_string(),
            "manual".to_string(),
        );
        assert_eq!(idea.status, IdeaStatus::Pending);
        assert!(idea.article_id.is_none());
        assert!(idea.rejection_reason.is_none());
    }
}
