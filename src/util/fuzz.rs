//! Fuzzy string ratios.
//!
//! Ratios are normalized Indel similarities in `[0, 1]`. [`token_set_ratio`]
//! compares whitespace-separated token sets so that word order and repeated
//! words do not matter, which is how templates are ranked against utterances
//! and how negatives are compared to a label's reference positive.

use std::collections::BTreeSet;

use crate::util::levenshtein::{indel_distance, normalized_similarity};

/// Similarity of two strings as `1 - indel / (len1 + len2)`.
pub fn ratio(s1: &str, s2: &str) -> f64 {
    let total = s1.chars().count() + s2.chars().count();
    normalized_similarity(indel_distance(s1, s2), total)
}

/// Token-set similarity of two strings.
///
/// Both inputs are split on whitespace into sets. When one set contains the
/// other the score is `1.0`. Otherwise the score is the best ratio between
/// the sorted intersection, the intersection plus the tokens only in `s1`,
/// and the intersection plus the tokens only in `s2`. Empty input scores 0.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = s1.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = s2.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = intersection.join(" ").chars().count();
    let separator = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + separator + ab_len;
    let sect_ba_len = sect_len + separator + ba_len;

    // The shared intersection prefix cancels out of the distance.
    let result = normalized_similarity(
        indel_distance(&diff_ab_joined, &diff_ba_joined),
        sect_ab_len + sect_ba_len,
    );

    if sect_len == 0 {
        return result;
    }

    let sect_ab_ratio = normalized_similarity(separator + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = normalized_similarity(separator + ba_len, sect_len + sect_ba_len);

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}
