//! Quality scorer: the publish gate
//!
//! Evaluates article HTML against a configurable set of content checks and
//! produces a `QualityAssessment`: a 0-100 score over the enabled checks, a
//! per-check breakdown, remediation issues, and the `can_publish` verdict.
//!
//! Scoring rules:
//! - Disabled checks are excluded from the denominator entirely.
//! - `score = round(100 × passed / total_enabled)`.
//! - `can_publish` is controlled ONLY by critical-check failures; an article
//!   with a high score and one failed critical check cannot publish, and a
//!   low-scoring article with all critical checks green can.
//!
//! The scorer is a pure function of (content, metadata, thresholds): identical
//! inputs always produce identical assessments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;
use crate::utils::html;

/// Injectable check thresholds
///
/// Every field has a documented default; callers override any subset. Values
/// normally come from the flat settings table (see `db::settings`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Word count window (default 800-2500), non-critical by default
    pub min_word_count: usize,
    pub max_word_count: usize,
    pub word_count_critical: bool,
    /// Internal link floor (default 3); always critical
    pub min_internal_links: usize,
    /// External citation floor (default 1); non-critical
    pub min_external_links: usize,
    /// FAQ/schema section required
    pub require_faq: bool,
    /// BLS-style citation required
    pub require_bls_citation: bool,
    /// H2+H3 heading floor, applied only when required
    pub require_headings: bool,
    pub min_heading_count: usize,
    /// Image floor and alt-text coverage, applied only when required
    pub require_images: bool,
    pub min_images: usize,
    pub require_alt_text: bool,
    /// Primary keyword density window in percent (default 0.5-2.5)
    pub min_keyword_density: f64,
    pub max_keyword_density: f64,
    /// Flesch Reading Ease window (default 60-80)
    pub min_readability: f64,
    pub max_readability: f64,
    /// Own-site host; links containing it count as internal
    pub site_host: Option<String>,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_word_count: 800,
            max_word_count: 2500,
            word_count_critical: false,
            min_internal_links: 3,
            min_external_links: 1,
            require_faq: false,
            require_bls_citation: false,
            require_headings: false,
            min_heading_count: 3,
            require_images: false,
            min_images: 1,
            require_alt_text: false,
            min_keyword_density: 0.5,
            max_keyword_density: 2.5,
            min_readability: 60.0,
            max_readability: 80.0,
            site_host: None,
        }
    }
}

/// Outcome of one enabled check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub critical: bool,
    /// Measured value, formatted for display
    pub value: String,
    /// Remediation text when the check failed
    pub issue: Option<String>,
}

/// Issue severity: `major` for failed critical checks, `minor` otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Minor,
    Major,
}

/// A failed check's remediation entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub message: String,
    pub severity: IssueSeverity,
}

/// Full assessment; recomputed on demand, never the source of truth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// round(100 × passed / enabled)
    pub score: u8,
    /// Per-check breakdown, keyed by check name (ordered deterministically)
    pub checks: BTreeMap<String, CheckOutcome>,
    pub issues: Vec<QualityIssue>,
    /// True iff no enabled critical check failed
    pub can_publish: bool,
}

/// Quality scorer over injectable thresholds
pub struct QualityScorer {
    thresholds: QualityThresholds,
}

impl QualityScorer {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Assess article HTML against the enabled checks
    ///
    /// `focus_keyword` enables the keyword-density check when present.
    pub fn assess(&self, content: &str, focus_keyword: Option<&str>) -> QualityAssessment {
        let t = &self.thresholds;
        let mut checks: BTreeMap<String, CheckOutcome> = BTreeMap::new();

        let words = html::word_count(content);
        checks.insert(
            "word_count".to_string(),
            outcome(
                words >= t.min_word_count && words <= t.max_word_count,
                t.word_count_critical,
                format!("{} words", words),
                format!(
                    "Adjust length to {}-{} words (currently {})",
                    t.min_word_count, t.max_word_count, words
                ),
            ),
        );

        let links = html::link_counts(content, t.site_host.as_deref());
        checks.insert(
            "internal_links".to_string(),
            outcome(
                links.internal >= t.min_internal_links,
                true,
                format!("{} internal links", links.internal),
                format!(
                    "Add at least {} internal links (found {})",
                    t.min_internal_links, links.internal
                ),
            ),
        );
        checks.insert(
            "external_links".to_string(),
            outcome(
                links.external >= t.min_external_links,
                false,
                format!("{} external citations", links.external),
                format!(
                    "Cite at least {} external sources (found {})",
                    t.min_external_links, links.external
                ),
            ),
        );

        if t.require_faq {
            checks.insert(
                "faq_section".to_string(),
                outcome(
                    html::has_faq_section(content),
                    true,
                    "FAQ section".to_string(),
                    "Add an FAQ section or FAQPage schema block".to_string(),
                ),
            );
        }

        if t.require_bls_citation {
            checks.insert(
                "bls_citation".to_string(),
                outcome(
                    html::has_bls_citation(content),
                    true,
                    "BLS citation".to_string(),
                    "Cite Bureau of Labor Statistics data (bls.gov)".to_string(),
                ),
            );
        }

        if t.require_headings {
            let headings = html::heading_count(content);
            checks.insert(
                "headings".to_string(),
                outcome(
                    headings >= t.min_heading_count,
                    false,
                    format!("{} H2/H3 headings", headings),
                    format!(
                        "Structure the article with at least {} H2/H3 headings (found {})",
                        t.min_heading_count, headings
                    ),
                ),
            );
        }

        if t.require_images {
            let (total, with_alt) = html::image_stats(content);
            let alt_ok = !t.require_alt_text || total == 0 || with_alt == total;
            checks.insert(
                "images".to_string(),
                outcome(
                    total >= t.min_images && alt_ok,
                    false,
                    format!("{} images, {} with alt text", total, with_alt),
                    format!(
                        "Include at least {} images with alt text on every image (found {}, {} with alt)",
                        t.min_images, total, with_alt
                    ),
                ),
            );
        }

        if let Some(keyword) = focus_keyword.filter(|k| !k.trim().is_empty()) {
            let density = html::keyword_density(content, keyword);
            checks.insert(
                "keyword_density".to_string(),
                outcome(
                    density >= t.min_keyword_density && density <= t.max_keyword_density,
                    false,
                    format!("{:.2}% density for \"{}\"", density, keyword),
                    format!(
                        "Bring \"{}\" density into {:.1}%-{:.1}% (currently {:.2}%)",
                        keyword, t.min_keyword_density, t.max_keyword_density, density
                    ),
                ),
            );
        }

        let readability = html::flesch_reading_ease(content);
        checks.insert(
            "readability".to_string(),
            outcome(
                readability >= t.min_readability && readability <= t.max_readability,
                false,
                format!("{:.1} Flesch Reading Ease", readability),
                format!(
                    "Adjust readability into {:.0}-{:.0} Flesch Reading Ease (currently {:.1})",
                    t.min_readability, t.max_readability, readability
                ),
            ),
        );

        let total = checks.len();
        let passed = checks.values().filter(|c| c.passed).count();
        let score = ((passed as f64 * 100.0 / total as f64).round()) as u8;
        let can_publish = checks.values().all(|c| c.passed || !c.critical);

        let issues = checks
            .values()
            .filter(|c| !c.passed)
            .filter_map(|c| {
                c.issue.as_ref().map(|message| QualityIssue {
                    message: message.clone(),
                    severity: if c.critical {
                        IssueSeverity::Major
                    } else {
                        IssueSeverity::Minor
                    },
                })
            })
            .collect();

        QualityAssessment {
            score,
            checks,
            issues,
            can_publish,
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(QualityThresholds::default())
    }
}

fn outcome(passed: bool, critical: bool, value: String, issue: String) -> CheckOutcome {
    CheckOutcome {
        passed,
        critical,
        value,
        issue: if passed { None } else { Some(issue) },
    }
}

/// Derive the article's coarse risk level from its assessment
///
/// Critical when the monetization precondition cannot hold, High when two or
/// more critical checks failed, Medium on a single critical failure or a score
/// below 70, Low otherwise. Humans may overwrite the stored value.
pub fn derive_risk_level(assessment: &QualityAssessment, has_monetization_shortcode: bool) -> RiskLevel {
    let critical_failures = assessment
        .checks
        .values()
        .filter(|c| c.critical && !c.passed)
        .count();

    if !has_monetization_shortcode {
        RiskLevel::Critical
    } else if critical_failures >= 2 {
        RiskLevel::High
    } else if critical_failures == 1 || assessment.score < 70 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ~1200 words, 3 internal links, 1 external citation, readable prose
    fn passing_content() -> String {
        let paragraph = "<p>The savings market moved again this week. Banks raised their \
            rates and savers took notice. A higher rate can add real money over a year. \
            We compared the top offers and found clear winners for most savers today.</p>";
        let mut content = String::new();
        content.push_str("<h2>Overview</h2>");
        for _ in 0..30 {
            content.push_str(paragraph);
        }
        content.push_str(
            r#"<p>See <a href="/savings">savings</a>, <a href="/cds">CDs</a>,
               and <a href="/checking">checking</a>, plus
               <a href="https://fdic.gov/data">FDIC data</a>.</p>"#,
        );
        content
    }

    #[test]
    fn test_deterministic() {
        let scorer = QualityScorer::default();
        let content = passing_content();
        let a = scorer.assess(&content, Some("savings"));
        let b = scorer.assess(&content, Some("savings"));
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_passing_content_can_publish() {
        let scorer = QualityScorer::default();
        let assessment = scorer.assess(&passing_content(), None);
        assert!(assessment.can_publish, "issues: {:?}", assessment.issues);
        assert!(assessment.checks["internal_links"].passed);
    }

    #[test]
    fn test_internal_link_failure_blocks_publish_regardless_of_score() {
        let scorer = QualityScorer::default();
        // 1200 words, zero internal links, otherwise healthy
        let paragraph = "<p>The savings market moved again this week. Banks raised their \
            rates and savers took notice. A higher rate can add real money over a year. \
            We compared the top offers and found clear winners for most savers today.</p>";
        let mut content = String::new();
        for _ in 0..30 {
            content.push_str(paragraph);
        }
        content.push_str(r#"<p><a href="https://fdic.gov/data">FDIC data</a></p>"#);

        let assessment = scorer.assess(&content, None);
        assert!(!assessment.checks["internal_links"].passed);
        assert!(!assessment.can_publish);
        // Only one of four enabled checks failed, so the score stays high
        assert!(assessment.score >= 75, "score was {}", assessment.score);
    }

    #[test]
    fn test_disabled_checks_excluded_from_denominator() {
        let scorer = QualityScorer::default();
        let assessment = scorer.assess(&passing_content(), None);
        // Defaults enable word_count, internal_links, external_links, readability
        assert_eq!(assessment.checks.len(), 4);
        assert!(!assessment.checks.contains_key("faq_section"));
        assert!(!assessment.checks.contains_key("keyword_density"));
    }

    #[test]
    fn test_focus_keyword_enables_density_check() {
        let scorer = QualityScorer::default();
        let assessment = scorer.assess(&passing_content(), Some("savings"));
        assert_eq!(assessment.checks.len(), 5);
        assert!(assessment.checks.contains_key("keyword_density"));
    }

    #[test]
    fn test_required_faq_is_critical() {
        let thresholds = QualityThresholds {
            require_faq: true,
            ..Default::default()
        };
        let scorer = QualityScorer::new(thresholds);
        let assessment = scorer.assess(&passing_content(), None);
        let faq = &assessment.checks["faq_section"];
        assert!(faq.critical);
        assert!(!faq.passed);
        assert!(!assessment.can_publish);
    }

    #[test]
    fn test_issue_severity_tracks_criticality() {
        let scorer = QualityScorer::default();
        let assessment = scorer.assess("<p>Too short.</p>", None);
        // internal_links failure is major, word_count failure is minor
        assert!(assessment
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Major && i.message.contains("internal links")));
        assert!(assessment
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Minor && i.message.contains("words")));
    }

    #[test]
    fn test_score_is_ratio_of_passed_checks() {
        let scorer = QualityScorer::default();
        let assessment = scorer.assess(&passing_content(), None);
        let passed = assessment.checks.values().filter(|c| c.passed).count();
        let expected = (passed as f64 * 100.0 / assessment.checks.len() as f64).round() as u8;
        assert_eq!(assessment.score, expected);
    }

    #[test]
    fn test_risk_level_derivation() {
        let scorer = QualityScorer::default();
        let good = scorer.assess(&passing_content(), None);
        assert_eq!(derive_risk_level(&good, true), RiskLevel::Low);
        assert_eq!(derive_risk_level(&good, false), RiskLevel::Critical);

        let bad = scorer.assess("<p>Too short.</p>", None);
        // One critical failure (internal links)
        assert_eq!(derive_risk_level(&bad, true), RiskLevel::Medium);
    }
}
