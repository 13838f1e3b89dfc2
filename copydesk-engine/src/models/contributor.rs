//! Contributor profiles
//!
//! Read-only input to contributor matching; the pipeline never mutates these.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candidate author voice/style profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: Uuid,
    pub name: String,
    /// Topic areas this contributor covers ("retirement", "mortgages", ...)
    pub expertise_areas: Vec<String>,
    /// Content types this contributor prefers ("roundup", "guide", ...)
    pub content_type_preferences: Vec<String>,
    /// Free-text style description passed to the humanization service
    pub style_profile: Option<String>,
}

impl Contributor {
    pub fn new(name: String, expertise_areas: Vec<String>, content_type_preferences: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            expertise_areas,
            content_type_preferences,
            style_profile: None,
        }
    }
}
