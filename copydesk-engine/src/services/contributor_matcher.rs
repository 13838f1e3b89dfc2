//! Contributor matching
//!
//! Point-based scoring of candidate authors against an idea's attributes.
//! Each rule fires at most once per contributor; the highest score wins and
//! ties break stably toward the earlier contributor in input order. An empty
//! candidate list is non-fatal: generation proceeds without a style profile.

use crate::models::{Contributor, Idea};

/// Expertise area matches a topic keyword (substring in either direction)
const EXPERTISE_KEYWORD_POINTS: u32 = 50;
/// Contributor prefers the idea's content type
const CONTENT_TYPE_POINTS: u32 = 30;
/// An expertise token appears inside the idea title
const TITLE_TOKEN_POINTS: u32 = 20;

/// Score a single contributor against an idea
pub fn score_contributor(idea: &Idea, contributor: &Contributor) -> u32 {
    let mut score = 0;

    let title_lower = idea.title.to_lowercase();
    let keywords_lower: Vec<String> = idea.keywords.iter().map(|k| k.to_lowercase()).collect();
    let areas_lower: Vec<String> = contributor
        .expertise_areas
        .iter()
        .map(|a| a.to_lowercase())
        .collect();

    if areas_lower.iter().any(|area| {
        keywords_lower
            .iter()
            .any(|kw| kw.contains(area.as_str()) || area.contains(kw.as_str()))
    }) {
        score += EXPERTISE_KEYWORD_POINTS;
    }

    if contributor
        .content_type_preferences
        .iter()
        .any(|pref| pref.eq_ignore_ascii_case(&idea.content_type))
    {
        score += CONTENT_TYPE_POINTS;
    }

    if areas_lower.iter().any(|area| title_lower.contains(area.as_str())) {
        score += TITLE_TOKEN_POINTS;
    }

    score
}

/// Highest-scoring contributor, or None when the list is empty or nothing
/// scores above zero
///
/// Iteration order is the input order, and strict `>` comparison keeps the
/// first of any tied pair, which is the deterministic tie-break callers rely on.
pub fn best_match<'a>(idea: &Idea, contributors: &'a [Contributor]) -> Option<&'a Contributor> {
    let mut best: Option<(&Contributor, u32)> = None;

    for contributor in contributors {
        let score = score_contributor(idea, contributor);
        if score == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((contributor, score)),
        }
    }

    if let Some((contributor, score)) = best {
        tracing::debug!(
            contributor = %contributor.name,
            score,
            idea_title = %idea.title,
            "Contributor matched"
        );
    }

    best.map(|(c, _)| c)
}
