//! HTML content statistics
//!
//! Regex-based inspection of article HTML shared by the quality scorer, the
//! revision validator, the scheduler's coarse checklist, and shortcode
//! validation. All functions are pure; none of them attempt full HTML parsing, as
//! generated article markup is flat enough that tag-level regexes are reliable.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*["']([^"']+)["']"#).unwrap());
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<h[23][\s>]").unwrap());
static IMG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img[^>]*>").unwrap());
static ALT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)alt\s*=\s*["'][^"']+["']"#).unwrap());
static FAQ_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-6][^>]*>[^<]*faq").unwrap());
static SHORTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([a-zA-Z][a-zA-Z0-9_-]*)(?:\s[^\]]*)?\]").unwrap());
static VOWEL_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[aeiouy]+").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Paragraph-level boundaries used when locating the region around a selection
const BLOCK_CLOSERS: [&str; 8] = [
    "</p>", "</h1>", "</h2>", "</h3>", "</h4>", "</h5>", "</h6>", "</li>",
];

/// Internal/external link breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
}

/// An `<a>` element: (href, anchor text with tags stripped)
pub type Anchor = (String, String);

/// Remove all tags, returning plain text with whitespace collapsed
pub fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Count words in the rendered text of an HTML fragment
pub fn word_count(html: &str) -> usize {
    strip_tags(html).split_whitespace().count()
}

/// All hrefs appearing in anchor tags, in document order
pub fn hrefs(html: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

/// All anchors as (href, stripped anchor text) pairs
pub fn anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|c| (c[1].to_string(), strip_tags(&c[2])))
        .collect()
}

/// Classify links as internal (relative or same-host) vs external citations
///
/// Fragment and mailto links count as neither.
pub fn link_counts(html: &str, site_host: Option<&str>) -> LinkCounts {
    let mut counts = LinkCounts::default();
    for href in hrefs(html) {
        let href_lower = href.to_lowercase();
        if href_lower.starts_with('#') || href_lower.starts_with("mailto:") {
            continue;
        }
        if href_lower.starts_with('/') {
            counts.internal += 1;
        } else if href_lower.starts_with("http") {
            match site_host {
                Some(host) if href_lower.contains(&host.to_lowercase()) => counts.internal += 1,
                _ => counts.external += 1,
            }
        }
    }
    counts
}

/// Count of H2 + H3 headings
pub fn heading_count(html: &str) -> usize {
    HEADING_RE.find_iter(html).count()
}

/// (total images, images with non-empty alt text)
pub fn image_stats(html: &str) -> (usize, usize) {
    let mut total = 0;
    let mut with_alt = 0;
    for img in IMG_RE.find_iter(html) {
        total += 1;
        if ALT_RE.is_match(img.as_str()) {
            with_alt += 1;
        }
    }
    (total, with_alt)
}

/// FAQ presence: an FAQPage JSON-LD block or a heading mentioning FAQ
pub fn has_faq_section(html: &str) -> bool {
    html.contains("FAQPage") || FAQ_HEADING_RE.is_match(html)
}

/// BLS-style citation presence: a bls.gov link or the bureau named in text
pub fn has_bls_citation(html: &str) -> bool {
    html.to_lowercase().contains("bls.gov")
        || strip_tags(html).contains("Bureau of Labor Statistics")
}

/// Density of a keyword phrase as a percentage of total words
///
/// Occurrences are counted case-insensitively over the stripped text.
pub fn keyword_density(html: &str, keyword: &str) -> f64 {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return 0.0;
    }
    let text = strip_tags(html).to_lowercase();
    let words = text.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }
    let occurrences = text.matches(&keyword).count();
    occurrences as f64 * 100.0 / words as f64
}

/// Approximate syllable count for one word: vowel runs, minimum 1
pub fn syllable_count(word: &str) -> usize {
    let runs = VOWEL_RUN_RE.find_iter(&word.to_lowercase()).count();
    runs.max(1)
}

/// Flesch Reading Ease over the rendered text of an HTML fragment
///
/// 206.835 − 1.015×(words/sentences) − 84.6×(syllables/words)
pub fn flesch_reading_ease(html: &str) -> f64 {
    let text = strip_tags(html);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();

    206.835 - 1.015 * (words.len() as f64 / sentences as f64)
        - 84.6 * (syllables as f64 / words.len() as f64)
}

/// All shortcode tag names appearing in the content (`[tag ...]` → "tag")
pub fn shortcode_tags(html: &str) -> Vec<String> {
    SHORTCODE_RE
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

/// Normalize a title for duplicate comparison: lowercase, alphanumeric + spaces
/// only, whitespace collapsed
pub fn normalize_title(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    WHITESPACE_RE.replace_all(lowered.trim(), " ").into_owned()
}

/// Byte range of the block-level paragraph containing `pos`
///
/// The region runs from just after the nearest preceding block closer
/// (`</p>`, heading close, `</li>`) to the end of the nearest following one,
/// clamped to the content bounds.
pub fn paragraph_bounds(content: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(content.len());
    let start = BLOCK_CLOSERS
        .iter()
        .filter_map(|closer| content[..pos].rfind(closer).map(|i| i + closer.len()))
        .max()
        .unwrap_or(0);
    let end = BLOCK_CLOSERS
        .iter()
        .filter_map(|closer| content[pos..].find(closer).map(|i| pos + i + closer.len()))
        .min()
        .unwrap_or(content.len());
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<h2>Overview</h2>
<p>Savings rates moved again. See <a href="/guides/savings">our guide</a> and
<a href="https://example.org/report">the report</a>.</p>
<h3>Details</h3>
<p><img src="a.png" alt="rate chart"><img src="b.png"></p>"#;

    #[test]
    fn test_strip_tags_collapses_whitespace() {
        let text = strip_tags("<p>Hello   <b>world</b></p>");
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("<p>one two three</p>"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_link_counts_relative_vs_external() {
        let counts = link_counts(SAMPLE, None);
        assert_eq!(counts.internal, 1);
        assert_eq!(counts.external, 1);
    }

    #[test]
    fn test_link_counts_site_host_reclassifies() {
        let counts = link_counts(SAMPLE, Some("example.org"));
        assert_eq!(counts.internal, 2);
        assert_eq!(counts.external, 0);
    }

    #[test]
    fn test_fragment_and_mailto_ignored() {
        let html = r##"<a href="#top">top</a><a href="mailto:x@y.z">mail</a>"##;
        let counts = link_counts(html, None);
        assert_eq!(counts.internal, 0);
        assert_eq!(counts.external, 0);
    }

    #[test]
    fn test_heading_count_h2_h3_only() {
        assert_eq!(heading_count(SAMPLE), 2);
        assert_eq!(heading_count("<h1>title</h1><h4>minor</h4>"), 0);
    }

    #[test]
    fn test_image_stats_alt_coverage() {
        let (total, with_alt) = image_stats(SAMPLE);
        assert_eq!(total, 2);
        assert_eq!(with_alt, 1);
    }

    #[test]
    fn test_faq_detection() {
        assert!(has_faq_section(r#"<h2>FAQ</h2>"#));
        assert!(has_faq_section(r#"<script type="application/ld+json">{"@type":"FAQPage"}</script>"#));
        assert!(!has_faq_section(SAMPLE));
    }

    #[test]
    fn test_bls_citation_detection() {
        assert!(has_bls_citation(r#"<a href="https://www.bls.gov/cpi/">CPI</a>"#));
        assert!(has_bls_citation("<p>Per the Bureau of Labor Statistics, wages rose.</p>"));
        assert!(!has_bls_citation(SAMPLE));
    }

    #[test]
    fn test_keyword_density() {
        let html = "<p>savings account rates for savings account holders</p>";
        // "savings account" appears twice in 7 words
        let density = keyword_density(html, "savings account");
        assert!((density - 2.0 * 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_syllable_heuristic_minimum_one() {
        assert_eq!(syllable_count("rhythm"), 1);
        assert_eq!(syllable_count("rate"), 2);
        assert_eq!(syllable_count("hello"), 2);
    }

    #[test]
    fn test_flesch_simple_text_is_easy() {
        let score = flesch_reading_ease("<p>The cat sat. The dog ran. We all had fun.</p>");
        assert!(score > 80.0, "short plain sentences should score high, got {}", score);
    }

    #[test]
    fn test_shortcode_tags() {
        let html = r#"<p>[affil_offer id="3"] text [disclosure] [unknown_tag foo]</p>"#;
        assert_eq!(shortcode_tags(html), vec!["affil_offer", "disclosure", "unknown_tag"]);
    }

    #[test]
    fn test_closing_shortcodes_not_matched() {
        assert!(shortcode_tags("[/affil_offer]").is_empty());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Best Savings Accounts, 2025!  "), "best savings accounts 2025");
        assert_eq!(normalize_title("Best   Savings"), "best savings");
    }

    #[test]
    fn test_paragraph_bounds() {
        let html = "<p>first block</p><p>second block with target text</p><p>third</p>";
        let pos = html.find("target").unwrap();
        let (start, end) = paragraph_bounds(html, pos);
        let region = &html[start..end];
        assert!(region.contains("second block"));
        assert!(!region.contains("first block"));
        assert!(!region.contains("third"));
    }

    #[test]
    fn test_paragraph_bounds_unbounded_edges() {
        let html = "no block markers at all";
        let (start, end) = paragraph_bounds(html, 5);
        assert_eq!((start, end), (0, html.len()));
    }
}
