//! Aho-Corasick index over one entity's phrases.

#[cfg(feature = "automaton")]
use aho_corasick::{AhoCorasick, MatchKind};

use crate::error::{HarkError, Result};

/// Multi-pattern automaton for the phrases of a single entity.
///
/// Patterns are the lower-cased phrases. A hit on a pattern reports every
/// original phrase registered for it, in registration order, so duplicates
/// are counted once per registration.
#[cfg(feature = "automaton")]
#[derive(Debug, Clone)]
pub struct EntityIndex {
    automaton: AhoCorasick,
    values: Vec<Vec<String>>,
}

#[cfg(feature = "automaton")]
impl EntityIndex {
    /// Build the automaton for `phrases`.
    pub fn build(phrases: &[String]) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut values: Vec<Vec<String>> = Vec::new();

        for phrase in phrases {
            let pattern = phrase.to_lowercase();
            match patterns.iter().position(|p| *p == pattern) {
                Some(idx) => values[idx].push(phrase.clone()),
                None => {
                    patterns.push(pattern);
                    values.push(vec![phrase.clone()]);
                }
            }
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| HarkError::configuration(format!("Failed to build automaton: {e}")))?;

        Ok(Self { automaton, values })
    }

    /// All phrases found in `haystack`, overlapping ones included, that are
    /// followed by a word boundary or the end of the haystack.
    pub fn find(&self, haystack: &str) -> Vec<&str> {
        self.automaton
            .find_overlapping_iter(haystack)
            .filter(|m| {
                haystack[m.end()..]
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric() && c != '_')
            })
            .flat_map(|m| self.values[m.pattern().as_usize()].iter().map(String::as_str))
            .collect()
    }
}

/// Placeholder when the crate is built without the `automaton` feature.
#[cfg(not(feature = "automaton"))]
#[derive(Debug, Clone)]
pub enum EntityIndex {}

#[cfg(not(feature = "automaton"))]
impl EntityIndex {
    pub fn build(_phrases: &[String]) -> Result<Self> {
        Err(HarkError::configuration(
            "indexed matching requires the `automaton` feature",
        ))
    }

    pub fn find(&self, _haystack: &str) -> Vec<&str> {
        match *self {}
    }
}
