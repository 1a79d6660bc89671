//! Configuration for entity matchers.

use serde::{Deserialize, Serialize};

/// How an [`EntityMatcher`](super::EntityMatcher) finds phrases in an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// One whole-word regex per phrase, case-sensitive as given.
    #[default]
    Naive,
    /// One Aho-Corasick automaton per entity over lower-cased phrases.
    ///
    /// Requires the `automaton` cargo feature.
    Indexed,
}

impl MatchStrategy {
    /// Whether this strategy can be used by the current build.
    pub fn is_available(&self) -> bool {
        match self {
            MatchStrategy::Naive => true,
            MatchStrategy::Indexed => cfg!(feature = "automaton"),
        }
    }
}

/// Entity matcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Matching strategy.
    pub strategy: MatchStrategy,
    /// Phrases never reported for entities whose name contains `_name`.
    pub ignore_list: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::Naive,
            ignore_list: Vec::new(),
        }
    }
}

impl MatcherConfig {
    /// Configuration for the indexed strategy.
    pub fn indexed() -> Self {
        Self {
            strategy: MatchStrategy::Indexed,
            ..Default::default()
        }
    }

    /// Replace the ignore list.
    pub fn with_ignore_list<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_list = words.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_naive() {
        let config = MatcherConfig::default();
        assert_eq!(config.strategy, MatchStrategy::Naive);
        assert!(config.ignore_list.is_empty());
        assert!(MatchStrategy::Naive.is_available());
    }

    #[test]
    fn test_strategy_serde() {
        let config: MatcherConfig =
            serde_json::from_str(r#"{"strategy": "indexed", "ignore_list": ["the"]}"#).unwrap();
        assert_eq!(config.strategy, MatchStrategy::Indexed);
        assert_eq!(config.ignore_list, vec!["the".to_string()]);
    }
}
