//! Edit distance.
//!
//! The Indel distance (insertions and deletions only) is the Levenshtein
//! dynamic program with substitutions charged 2. The fuzzy ratios in
//! [`crate::util::fuzz`] are normalized Indel distances.

use std::cmp::min;

/// Edit distance where a substitution costs `substitution_cost`.
///
/// Uses two rows instead of the full matrix.
#[allow(clippy::needless_range_loop)]
fn weighted_distance(s1: &str, s2: &str, substitution_cost: usize) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;

        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] {
                0
            } else {
                substitution_cost
            };

            curr_row[j] = min(
                min(
                    prev_row[j] + 1,     // deletion
                    curr_row[j - 1] + 1, // insertion
                ),
                prev_row[j - 1] + cost, // substitution
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len2]
}

/// Calculate the Indel distance: the number of insertions and deletions
/// needed to turn `s1` into `s2`.
pub fn indel_distance(s1: &str, s2: &str) -> usize {
    weighted_distance(s1, s2, 2)
}

/// Indel distance normalized to a similarity in `[0, 1]`.
///
/// `total_len` is the combined length the distance is measured against;
/// two empty inputs are identical.
pub fn normalized_similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 1.0;
    }
    1.0 - distance as f64 / total_len as f64
}
