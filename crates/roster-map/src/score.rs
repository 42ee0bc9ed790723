//! Tiered scoring of a normalized header against a normalized pattern.
//!
//! - 100: exact match
//! - 90: one string contains the other
//! - 75: longest common substring covers at least 60% of the shorter string
//! - 0: no match

use roster_model::mapping::{CONFIDENCE_EXACT, CONFIDENCE_FUZZY, CONFIDENCE_PARTIAL};

/// Minimum share of the shorter string a common substring must cover.
const FUZZY_RATIO_MIN: f64 = 0.6;

/// Scores a normalized header against one normalized pattern.
pub fn score_pair(header: &str, pattern: &str) -> u8 {
    if header.is_empty() || pattern.is_empty() {
        return 0;
    }
    if header == pattern {
        return CONFIDENCE_EXACT;
    }
    if header.contains(pattern) || pattern.contains(header) {
        return CONFIDENCE_PARTIAL;
    }
    let shorter_len = header.chars().count().min(pattern.chars().count());
    let common = longest_common_substring(header, pattern);
    if common as f64 / shorter_len as f64 >= FUZZY_RATIO_MIN {
        return CONFIDENCE_FUZZY;
    }
    0
}

/// Length in characters of the longest common substring of `a` and `b`.
pub fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut best = 0;
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            best = best.max(current[j + 1]);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_scores_100() {
        assert_eq!(score_pair("visa type", "visa type"), 100);
        assert_eq!(score_pair("학번", "학번"), 100);
    }

    #[test]
    fn containment_either_direction_scores_90() {
        assert_eq!(score_pair("current visa type", "visa type"), 90);
        assert_eq!(score_pair("passport", "passport number"), 90);
    }

    #[test]
    fn short_korean_patterns_match_inside_longer_headers() {
        assert_eq!(score_pair("학과명", "학과"), 90);
        assert_eq!(score_pair("국적 국가명", "국적"), 90);
        assert_eq!(score_pair("성별구분", "성별"), 90);
        assert_eq!(score_pair("no", "passport no"), 90);
    }

    #[test]
    fn short_patterns_match_fuzzily_on_a_shared_pair() {
        // "ab" covers two thirds of "abc"
        assert_eq!(score_pair("xaby", "abc"), 75);
        assert_eq!(score_pair("xayb", "abc"), 0);
    }

    #[test]
    fn fuzzy_requires_sixty_percent_overlap() {
        // "nationalty" vs "nationality": common "national" (8) / 10
        assert_eq!(score_pair("nationalty", "nationality"), 75);
        assert_eq!(score_pair("zodiac sign", "nationality"), 0);
    }

    #[test]
    fn empty_never_matches() {
        assert_eq!(score_pair("", "name"), 0);
        assert_eq!(score_pair("name", ""), 0);
    }

    #[test]
    fn lcs_lengths() {
        assert_eq!(longest_common_substring("abcdef", "zcdez"), 3);
        assert_eq!(longest_common_substring("abc", "xyz"), 0);
        assert_eq!(longest_common_substring("", "xyz"), 0);
    }
}
