//! Title similarity scoring for duplicate detection
//!
//! Normalized Levenshtein distance over case-normalized strings. An incoming
//! idea is a near-duplicate of an existing title when similarity exceeds the
//! configured threshold (default 0.70).

/// Default near-duplicate threshold; tunable via the
/// `dedup_similarity_threshold` setting
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.70;

/// Similarity between two strings in [0, 1]
///
/// `1 − levenshtein(a, b) / max(len)` over lowercased, trimmed input.
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    1.0 - distance as f64 / longer as f64
}

/// Duplicate decision against a set of existing titles
///
/// Returns the best match at or above `threshold`, if any, with its score.
pub fn find_near_duplicate<'a, I>(title: &str, existing: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in existing {
        let score = similarity(title, candidate);
        if score > threshold && best.map_or(true, |(_, b)| score > b) {
            best = Some((candidate, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(similarity("Best CD Rates", "Best CD Rates"), 1.0);
    }

    #[test]
    fn test_symmetry() {
        let a = "High-yield savings accounts";
        let b = "High-yield checking accounts";
        assert_eq!(similarity(a, b), similarity(b, a));
    }

    #[test]
    fn test_both_empty_score_one() {
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_empty_vs_nonempty() {
        // distance == len(b), so similarity is 0
        assert_eq!(similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_case_normalization() {
        assert_eq!(similarity("BEST cd RATES", "best CD rates"), 1.0);
    }

    #[test]
    fn test_near_duplicate_detected_above_threshold() {
        let existing = vec!["Best savings accounts for 2025"];
        let result = find_near_duplicate(
            "Best savings account for 2025",
            existing.iter().map(|s| &**s),
            DEFAULT_DUPLICATE_THRESHOLD,
        );
        let (matched, score) = result.expect("one-letter difference should exceed 0.70");
        assert_eq!(matched, "Best savings accounts for 2025");
        assert!(score > 0.9);
    }

    #[test]
    fn test_unrelated_titles_not_duplicates() {
        let existing = vec!["How to refinance a mortgage"];
        let result = find_near_duplicate(
            "Best travel credit cards",
            existing.iter().map(|s| &**s),
            DEFAULT_DUPLICATE_THRESHOLD,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_best_match_wins() {
        let existing = vec!["Best CD rates today", "Best CD rate today"];
        let (matched, _) = find_near_duplicate(
            "Best CD rate today",
            existing.iter().map(|s| &**s),
            DEFAULT_DUPLICATE_THRESHOLD,
        )
        .unwrap();
        assert_eq!(matched, "Best CD rate today");
    }
}
