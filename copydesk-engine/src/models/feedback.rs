//! Human review feedback items
//!
//! A feedback item pairs a reviewer comment with the text it was anchored to.
//! The revision validator later checks, against before/after content, whether
//! the requested change was actually applied.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single reviewer request against an article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: Uuid,
    /// Reviewer-assigned category ("accuracy", "style", ...)
    pub category: String,
    /// Reviewer-assigned severity ("low", "medium", "high")
    pub severity: String,
    /// Text the reviewer highlighted, if any
    pub selected_text: Option<String>,
    /// The request itself
    pub comment: String,
}

impl FeedbackItem {
    pub fn new(category: String, severity: String, selected_text: Option<String>, comment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            severity,
            selected_text,
            comment,
        }
    }
}
