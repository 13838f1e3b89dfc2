//! Article record and version snapshots
//!
//! Articles progress through:
//! draft → in_review → refinement → qa_review → approved → published
//! with `needs_revision` as the human-review detour. Every substantive content
//! change writes an immutable `ArticleVersion` snapshot; the article row keeps
//! only the latest content plus a pointer-equivalent (newest version wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Article review/publication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    InReview,
    Refinement,
    QaReview,
    Approved,
    Published,
    NeedsRevision,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::InReview => "in_review",
            ArticleStatus::Refinement => "refinement",
            ArticleStatus::QaReview => "qa_review",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Published => "published",
            ArticleStatus::NeedsRevision => "needs_revision",
        }
    }

    /// States counted as generation-in-progress by the scheduler's
    /// concurrency cap
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ArticleStatus::Draft | ArticleStatus::InReview)
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "in_review" => Ok(ArticleStatus::InReview),
            "refinement" => Ok(ArticleStatus::Refinement),
            "qa_review" => Ok(ArticleStatus::QaReview),
            "approved" => Ok(ArticleStatus::Approved),
            "published" => Ok(ArticleStatus::Published),
            "needs_revision" => Ok(ArticleStatus::NeedsRevision),
            other => Err(format!("Unknown article status: {}", other)),
        }
    }
}

/// Coarse compliance/quality exposure classification
///
/// Independent of the numeric quality score; automated publication never
/// touches High or Critical articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Whether the scheduler may auto-publish at this risk level
    pub fn allows_auto_publish(&self) -> bool {
        matches!(self, RiskLevel::Low | RiskLevel::Medium)
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

/// Generated article record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    /// Full article body as HTML
    pub content: String,
    pub excerpt: String,
    pub target_keywords: Vec<String>,
    pub word_count: i64,
    pub status: ArticleStatus,
    /// Latest quality score snapshot (0-100); recomputed on demand
    pub quality_score: Option<i64>,
    /// Latest quality issue snapshot (remediation text)
    pub quality_issues: Vec<String>,
    pub risk_level: RiskLevel,
    /// Review window end; auto-post eligibility begins when this passes
    pub auto_publish_deadline: Option<DateTime<Utc>>,
    pub contributor_id: Option<Uuid>,
    pub published_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create a new draft article
    pub fn new(title: String, content: String, excerpt: String, target_keywords: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            excerpt,
            target_keywords,
            word_count: 0,
            status: ArticleStatus::Draft,
            quality_score: None,
            quality_issues: Vec::new(),
            risk_level: RiskLevel::Medium,
            auto_publish_deadline: None,
            contributor_id: None,
            published_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Provenance of a version snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// First persisted generation output
    Original,
    /// Content rewritten by an AI revision pass
    AiRevision,
    /// Content edited by a human
    ManualEdit,
}

impl VersionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::Original => "original",
            VersionSource::AiRevision => "ai_revision",
            VersionSource::ManualEdit => "manual_edit",
        }
    }
}

impl std::str::FromStr for VersionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(VersionSource::Original),
            "ai_revision" => Ok(VersionSource::AiRevision),
            "manual_edit" => Ok(VersionSource::ManualEdit),
            other => Err(format!("Unknown version source: {}", other)),
        }
    }
}

/// Immutable content snapshot, written on every substantive content change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleVersion {
    pub id: Uuid,
    pub article_id: Uuid,
    pub content: String,
    pub source: VersionSource,
    pub created_at: DateTime<Utc>,
}

impl ArticleVersion {
    pub fn new(article_id: Uuid, content: String, source: VersionSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            article_id,
            content,
            source,
            created_at: Utc::now(),
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
            ArticleStatus::Draft,
            ArticleStatus::InReview,
            ArticleStatus::Refinement,
            ArticleStatus::QaReview,
            ArticleStatus::Approved,
            ArticleStatus::Published,
            ArticleStatus::NeedsRevision,
        ] {
            assert_eq!(ArticleStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_in_progress_states() {
        assert!(ArticleStatus::Draft.is_in_progress());
        assert!(ArticleStatus::InReview.is_in_progress());
        assert!(!ArticleStatus::Approved.is_in_progress());
        assert!(!ArticleStatus::Published.is_in_progress());
    }

    #[test]
    fn test_risk_gating() {
        assert!(RiskLevel::Low.allows_auto_publish());
        assert!(RiskLevel::Medium.allows_auto_publish());
        assert!(!RiskLevel::High.allows_auto_publish());
        assert!(!RiskLevel::Critical.allows_auto_publish());
    }
}
