//! Revision validator
//!
//! Classifies each reviewer feedback item by intent, then checks before/after
//! article content for evidence that the requested change was applied. The
//! result is advisory: it flags items for human attention and never blocks a
//! save.
//!
//! Intent classification is an ordered rule list: the first matching category
//! wins, making precedence explicit and testable:
//! Link → TextCorrection → Removal → Addition → Generic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::FeedbackItem;
use crate::utils::html;

const LINK_KEYWORDS: [&str; 6] = ["link", "href", "url", "reference", "cite", "citation"];
const CORRECTION_KEYWORDS: [&str; 6] = ["typo", "fix", "incorrect", "wrong", "spelling", "grammar"];
const REMOVAL_KEYWORDS: [&str; 5] = ["remove", "delete", "cut", "drop", "eliminate"];
const ADDITION_KEYWORDS: [&str; 5] = ["add", "include", "missing", "insert", "expand"];
const RANKING_TOKENS: [&str; 5] = ["ranking", "rank", "report", "study", "index"];

/// Selected text like `$15,5006`: a comma group of the wrong width
static MALFORMED_CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\d{1,3},\d{4,}").unwrap());

/// Paragraph length delta treated as evidence of a targeted rewrite
const PARAGRAPH_DELTA_THRESHOLD: f64 = 0.10;
/// Whole-document delta treated as evidence of a broad rewrite
const DOCUMENT_DELTA_THRESHOLD: f64 = 0.05;

/// Classified intent of a feedback comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackIntent {
    Link,
    TextCorrection,
    Removal,
    Addition,
    Generic,
}

/// Per-item verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Evidence found that the request was satisfied
    Addressed,
    /// Could not verify either way; needs human eyes
    Partial,
    /// Evidence found that the request was NOT satisfied
    Failed,
    /// Nothing to classify (empty comment)
    Unknown,
}

/// Verification result for one feedback item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemValidation {
    pub item_id: Uuid,
    pub intent: FeedbackIntent,
    pub status: ItemStatus,
    /// What the validator observed in the revised content
    pub evidence: Vec<String>,
    /// Caveats for the reviewer (manual-review requests land here)
    pub warnings: Vec<String>,
}

/// Aggregate over all items of one revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionReport {
    /// True iff no item failed
    pub success: bool,
    pub addressed_count: usize,
    pub partial_count: usize,
    pub failed_count: usize,
    pub items: Vec<ItemValidation>,
    /// Deterministic human-readable rollup
    pub summary: String,
}

/// Classify a comment (and optional selection) into an intent
///
/// First matching category in priority order wins.
pub fn classify_intent(comment: &str, selected_text: Option<&str>) -> FeedbackIntent {
    let comment_lower = comment.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| comment_lower.contains(k));

    if has_any(&LINK_KEYWORDS) {
        FeedbackIntent::Link
    } else if has_any(&CORRECTION_KEYWORDS)
        || selected_text.is_some_and(|s| MALFORMED_CURRENCY_RE.is_match(s))
    {
        FeedbackIntent::TextCorrection
    } else if has_any(&REMOVAL_KEYWORDS) {
        FeedbackIntent::Removal
    } else if has_any(&ADDITION_KEYWORDS) {
        FeedbackIntent::Addition
    } else {
        FeedbackIntent::Generic
    }
}

/// Stateless revision validator
pub struct RevisionValidator;

impl RevisionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate all feedback items against before/after content
    pub fn validate(
        &self,
        original: &str,
        revised: &str,
        feedback_items: &[FeedbackItem],
    ) -> RevisionReport {
        let items: Vec<ItemValidation> = feedback_items
            .iter()
            .map(|item| self.validate_item(original, revised, item))
            .collect();

        let addressed_count = items.iter().filter(|i| i.status == ItemStatus::Addressed).count();
        let failed_count = items.iter().filter(|i| i.status == ItemStatus::Failed).count();
        let partial_count = items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Partial | ItemStatus::Unknown))
            .count();

        let summary = format!(
            "{} addressed, {} partial, {} failed of {} feedback items",
            addressed_count,
            partial_count,
            failed_count,
            items.len()
        );

        tracing::debug!(
            addressed = addressed_count,
            partial = partial_count,
            failed = failed_count,
            "Revision validation complete"
        );

        RevisionReport {
            success: failed_count == 0,
            addressed_count,
            partial_count,
            failed_count,
            items,
            summary,
        }
    }

    fn validate_item(&self, original: &str, revised: &str, item: &FeedbackItem) -> ItemValidation {
        if item.comment.trim().is_empty() {
            return ItemValidation {
                item_id: item.id,
                intent: FeedbackIntent::Generic,
                status: ItemStatus::Unknown,
                evidence: Vec::new(),
                warnings: vec!["Empty feedback comment; nothing to verify".to_string()],
            };
        }

        let selected = item.selected_text.as_deref().filter(|s| !s.trim().is_empty());
        let intent = classify_intent(&item.comment, selected);

        let (status, evidence, warnings) = match intent {
            FeedbackIntent::Link => check_link_request(original, revised, &item.comment),
            FeedbackIntent::TextCorrection => check_text_correction(original, revised, selected),
            FeedbackIntent::Removal => check_removal(original, revised, selected),
            FeedbackIntent::Addition => check_addition(original, revised),
            FeedbackIntent::Generic => check_generic(original, revised, selected),
        };

        ItemValidation {
            item_id: item.id,
            intent,
            status,
            evidence,
            warnings,
        }
    }
}

impl Default for RevisionValidator {
    fn default() -> Self {
        Self::new()
    }
}

type CheckResult = (ItemStatus, Vec<String>, Vec<String>);

fn check_link_request(original: &str, revised: &str, comment: &str) -> CheckResult {
    let original_hrefs = html::hrefs(original);
    let revised_hrefs = html::hrefs(revised);
    let revised_anchors = html::anchors(revised);

    let new_anchors: Vec<&(String, String)> = revised_anchors
        .iter()
        .filter(|(href, _)| !original_hrefs.contains(href))
        .collect();

    let comment_lower = comment.to_lowercase();
    let wants_ranking = RANKING_TOKENS.iter().any(|t| comment_lower.contains(t));

    if wants_ranking {
        // Ranking/report language demands a link whose anchor text or URL
        // carries a ranking-related token
        let matching = new_anchors.iter().find(|(href, text)| {
            let haystack = format!("{} {}", href.to_lowercase(), text.to_lowercase());
            RANKING_TOKENS.iter().any(|t| haystack.contains(t))
        });
        return match matching {
            Some((href, _)) => (
                ItemStatus::Addressed,
                vec![format!("New ranking-related link added: {}", href)],
                Vec::new(),
            ),
            None => (
                ItemStatus::Failed,
                vec!["No new link with ranking-related anchor text or URL found".to_string()],
                Vec::new(),
            ),
        };
    }

    let link_count_increased = revised_hrefs.len() > original_hrefs.len();
    if link_count_increased || !new_anchors.is_empty() {
        let mut evidence = Vec::new();
        if link_count_increased {
            evidence.push(format!(
                "Link count increased from {} to {}",
                original_hrefs.len(),
                revised_hrefs.len()
            ));
        }
        if let Some((href, _)) = new_anchors.first() {
            evidence.push(format!("New link target: {}", href));
        }
        (ItemStatus::Addressed, evidence, Vec::new())
    } else {
        (
            ItemStatus::Failed,
            vec!["No new links found in revised content".to_string()],
            Vec::new(),
        )
    }
}

fn check_text_correction(original: &str, revised: &str, selected: Option<&str>) -> CheckResult {
    let Some(selected) = selected else {
        return (
            ItemStatus::Partial,
            Vec::new(),
            vec!["No text selected; correction cannot be verified".to_string()],
        );
    };

    if !original.contains(selected) {
        return (
            ItemStatus::Partial,
            Vec::new(),
            vec!["Selected text not found in original; cannot verify correction".to_string()],
        );
    }

    if revised.contains(selected) {
        (
            ItemStatus::Failed,
            vec![format!("Flagged text still present: \"{}\"", truncate(selected, 60))],
            Vec::new(),
        )
    } else {
        (
            ItemStatus::Addressed,
            vec![format!("Flagged text no longer appears: \"{}\"", truncate(selected, 60))],
            Vec::new(),
        )
    }
}

fn check_removal(original: &str, revised: &str, selected: Option<&str>) -> CheckResult {
    let Some(selected) = selected else {
        return (
            ItemStatus::Partial,
            Vec::new(),
            vec!["No text selected; removal cannot be verified".to_string()],
        );
    };

    if !original.contains(selected) {
        return (
            ItemStatus::Partial,
            Vec::new(),
            vec!["Selected text not found in original; removal cannot be verified".to_string()],
        );
    }

    if revised.contains(selected) {
        (
            ItemStatus::Failed,
            vec![format!("Text still present: \"{}\"", truncate(selected, 60))],
            Vec::new(),
        )
    } else {
        (
            ItemStatus::Addressed,
            vec![format!("Text removed: \"{}\"", truncate(selected, 60))],
            Vec::new(),
        )
    }
}

fn check_addition(original: &str, revised: &str) -> CheckResult {
    if revised.len() > original.len() {
        (
            ItemStatus::Addressed,
            vec![format!(
                "Content grew from {} to {} characters",
                original.len(),
                revised.len()
            )],
            Vec::new(),
        )
    } else {
        (
            ItemStatus::Partial,
            Vec::new(),
            vec!["Content did not grow; requested addition may be missing".to_string()],
        )
    }
}

fn check_generic(original: &str, revised: &str, selected: Option<&str>) -> CheckResult {
    if let Some(selected) = selected {
        if original.contains(selected) && !revised.contains(selected) {
            return (
                ItemStatus::Addressed,
                vec![format!("Selected text changed or removed: \"{}\"", truncate(selected, 60))],
                Vec::new(),
            );
        }

        // Selection unchanged; look for a meaningful rewrite of its paragraph
        if let (Some(orig_pos), Some(rev_pos)) = (original.find(selected), revised.find(selected)) {
            let (os, oe) = html::paragraph_bounds(original, orig_pos);
            let (rs, re) = html::paragraph_bounds(revised, rev_pos);
            let orig_len = (oe - os) as f64;
            let rev_len = (re - rs) as f64;
            if orig_len > 0.0 {
                let delta = (rev_len - orig_len).abs() / orig_len;
                if delta >= PARAGRAPH_DELTA_THRESHOLD {
                    return (
                        ItemStatus::Addressed,
                        vec![format!(
                            "Paragraph around selection changed by {:.0}%",
                            delta * 100.0
                        )],
                        Vec::new(),
                    );
                }
            }
        }
    }

    // Whole-document deltas as last resort
    let orig_words = html::word_count(original) as f64;
    let rev_words = html::word_count(revised) as f64;
    let word_delta = if orig_words > 0.0 {
        (rev_words - orig_words).abs() / orig_words
    } else {
        0.0
    };
    let char_delta = if !original.is_empty() {
        (revised.len() as f64 - original.len() as f64).abs() / original.len() as f64
    } else {
        0.0
    };

    if word_delta > DOCUMENT_DELTA_THRESHOLD || char_delta > DOCUMENT_DELTA_THRESHOLD {
        (
            ItemStatus::Addressed,
            vec![format!(
                "Document changed substantially ({:.0}% words, {:.0}% characters)",
                word_delta * 100.0,
                char_delta * 100.0
            )],
            Vec::new(),
        )
    } else {
        (
            ItemStatus::Partial,
            Vec::new(),
            vec!["No measurable change detected; manual review recommended".to_string()],
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
