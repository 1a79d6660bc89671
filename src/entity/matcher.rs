//! Keyword matching over named phrase sets.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use ahash::AHashMap;
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::config::{MatchStrategy, MatcherConfig};
use crate::entity::index::EntityIndex;
use crate::error::{HarkError, Result};

/// Phrases shorter than this (in characters) never match.
pub const MIN_PHRASE_CHARS: usize = 3;

/// Entities whose name contains this marker honor the ignore list.
pub const NAME_ENTITY_MARKER: &str = "_name";

/// Punctuation stripped from both ends of an utterance before indexed matching.
const STRIP_CHARS: &[char] = &['.', '!', '?', ',', ';', ':'];

const BLOB_MAGIC: &[u8; 4] = b"HKEM";
const BLOB_VERSION: [u8; 2] = [1, 0];

/// A binary feature vector; one `0.0`/`1.0` slot per registered entity.
pub type FeatureVector = Vec<f64>;

/// One phrase of one entity found in an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityMatch {
    /// Entity name.
    pub entity: String,
    /// The registered phrase that matched.
    pub value: String,
}

/// Persisted form of a matcher. Automata themselves are not stored; every
/// indexed entity is rebuilt on first use after loading.
#[derive(Serialize, Deserialize)]
struct MatcherSnapshot {
    strategy: MatchStrategy,
    entities: BTreeMap<String, Vec<String>>,
    pending: BTreeSet<String>,
    ignore_list: Vec<String>,
}

/// Named sets of keyword phrases with whole-word matching.
///
/// Entities are kept sorted by name; that order defines the layout of
/// [`EntityMatcher::one_hot_encode`]. Indexes and compiled patterns are built
/// lazily on the first lookup after a registration, so lookups only need
/// `&self`. A phrase registered twice matches twice under either strategy.
pub struct EntityMatcher {
    strategy: MatchStrategy,
    ignore_list: Vec<String>,
    entities: BTreeMap<String, Vec<String>>,
    /// Entities whose automaton must be rebuilt before the next lookup.
    pending: Mutex<BTreeSet<String>>,
    indexes: RwLock<AHashMap<String, EntityIndex>>,
    /// Compiled whole-word patterns, keyed by phrase.
    patterns: RwLock<AHashMap<String, Regex>>,
}

impl fmt::Debug for EntityMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMatcher")
            .field("strategy", &self.strategy)
            .field("entities", &self.entities.len())
            .field("ignore_list", &self.ignore_list)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl Default for EntityMatcher {
    fn default() -> Self {
        Self::naive()
    }
}

impl EntityMatcher {
    /// Create a matcher from `config`.
    ///
    /// Fails with a configuration error when the requested strategy is not
    /// available in this build.
    pub fn new(config: MatcherConfig) -> Result<Self> {
        if !config.strategy.is_available() {
            return Err(HarkError::configuration(format!(
                "matching strategy {:?} is not available; enable the `automaton` feature",
                config.strategy
            )));
        }

        Ok(Self::with_parts(
            config.strategy,
            config.ignore_list,
            BTreeMap::new(),
        ))
    }

    /// Create a matcher using the naive regex strategy.
    pub fn naive() -> Self {
        Self::with_parts(MatchStrategy::Naive, Vec::new(), BTreeMap::new())
    }

    /// Create a matcher using the indexed (Aho-Corasick) strategy.
    pub fn indexed() -> Result<Self> {
        Self::new(MatcherConfig::indexed())
    }

    fn with_parts(
        strategy: MatchStrategy,
        ignore_list: Vec<String>,
        entities: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let pending = match strategy {
            MatchStrategy::Indexed => entities.keys().cloned().collect(),
            MatchStrategy::Naive => BTreeSet::new(),
        };

        Self {
            strategy,
            ignore_list: ignore_list.iter().map(|w| w.to_lowercase()).collect(),
            entities,
            pending: Mutex::new(pending),
            indexes: RwLock::new(AHashMap::new()),
            patterns: RwLock::new(AHashMap::new()),
        }
    }

    /// The matching strategy in use.
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Words ignored for `_name` entities (lower-cased).
    pub fn ignore_list(&self) -> &[String] {
        &self.ignore_list
    }

    /// Sorted entity names; the feature vector layout.
    pub fn labels(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Phrases registered for `name`, in registration order.
    pub fn phrases(&self, name: &str) -> Option<&[String]> {
        self.entities.get(name).map(Vec::as_slice)
    }

    /// Append `phrases` to the entity `name`, creating it if needed.
    pub fn register<I, S>(&mut self, name: &str, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities
            .entry(name.to_string())
            .or_default()
            .extend(phrases.into_iter().map(Into::into));

        if self.strategy == MatchStrategy::Indexed {
            self.pending.get_mut().insert(name.to_string());
        }
    }

    /// Remove the entity `name` together with its index. Unknown names are ignored.
    pub fn deregister(&mut self, name: &str) {
        self.entities.remove(name);
        self.indexes.get_mut().remove(name);
        self.pending.get_mut().remove(name);
    }

    /// Drop every entity, keeping the strategy and ignore list.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.indexes.get_mut().clear();
        self.pending.get_mut().clear();
        self.patterns.get_mut().clear();
    }

    /// Lazily yield every `(entity, phrase)` pair found in `utterance`.
    ///
    /// Entities are visited in name order. The naive strategy matches the
    /// utterance as given; the indexed strategy lower-cases it and strips
    /// surrounding punctuation first.
    pub fn matches<'a>(&'a self, utterance: &str) -> impl Iterator<Item = EntityMatch> + 'a {
        let haystack = self.prepare(utterance);
        self.ensure_indexed();

        self.entities
            .keys()
            .flat_map(move |name| self.match_entity(name, &haystack))
    }

    /// At most one value per entity: the longest matched phrase, the first
    /// seen on ties.
    pub fn extract(&self, utterance: &str) -> BTreeMap<String, String> {
        let mut extracted: BTreeMap<String, String> = BTreeMap::new();
        for m in self.matches(utterance) {
            let longer = extracted
                .get(&m.entity)
                .is_none_or(|current| m.value.chars().count() > current.chars().count());
            if longer {
                extracted.insert(m.entity, m.value);
            }
        }
        extracted
    }

    /// Binary vector over the sorted entity names; slot `i` is `1.0` when
    /// entity `i` matched at least once.
    pub fn one_hot_encode(&self, utterance: &str) -> FeatureVector {
        let hits: BTreeSet<String> = self.matches(utterance).map(|m| m.entity).collect();
        self.entities
            .keys()
            .map(|name| if hits.contains(name) { 1.0 } else { 0.0 })
            .collect()
    }

    fn prepare(&self, utterance: &str) -> String {
        match self.strategy {
            MatchStrategy::Naive => utterance.to_string(),
            MatchStrategy::Indexed => utterance.to_lowercase().trim_matches(STRIP_CHARS).to_string(),
        }
    }

    /// Rebuild the automata of every entity registered since the last lookup.
    fn ensure_indexed(&self) {
        if self.strategy != MatchStrategy::Indexed {
            return;
        }

        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return;
        }

        let mut indexes = self.indexes.write();
        for name in pending.iter() {
            let Some(phrases) = self.entities.get(name) else {
                continue;
            };
            match EntityIndex::build(phrases) {
                Ok(index) => {
                    indexes.insert(name.clone(), index);
                }
                Err(e) => warn!("Skipping index for entity '{name}': {e}"),
            }
        }
        debug!("Rebuilt {} entity index(es)", pending.len());
        pending.clear();
    }

    fn match_entity(&self, name: &str, haystack: &str) -> Vec<EntityMatch> {
        let Some(phrases) = self.entities.get(name) else {
            return Vec::new();
        };
        if haystack.is_empty() || phrases.is_empty() {
            return Vec::new();
        }

        let values: Vec<String> = match self.strategy {
            MatchStrategy::Naive => phrases
                .iter()
                .filter(|phrase| self.accepts(name, phrase))
                .filter(|phrase| self.phrase_matches(phrase, haystack))
                .cloned()
                .collect(),
            MatchStrategy::Indexed => {
                let indexes = self.indexes.read();
                match indexes.get(name) {
                    Some(index) => index
                        .find(haystack)
                        .into_iter()
                        .filter(|value| self.accepts(name, value))
                        .map(str::to_string)
                        .collect(),
                    None => Vec::new(),
                }
            }
        };

        values
            .into_iter()
            .map(|value| EntityMatch {
                entity: name.to_string(),
                value,
            })
            .collect()
    }

    fn accepts(&self, name: &str, phrase: &str) -> bool {
        if phrase.chars().count() < MIN_PHRASE_CHARS {
            return false;
        }
        if name.contains(NAME_ENTITY_MARKER) {
            let lowered = phrase.to_lowercase();
            return !self.ignore_list.contains(&lowered);
        }
        true
    }

    fn phrase_matches(&self, phrase: &str, haystack: &str) -> bool {
        if let Some(pattern) = self.patterns.read().get(phrase) {
            return pattern.is_match(haystack);
        }

        match Regex::new(&format!(r"\b{}\b", regex::escape(phrase))) {
            Ok(pattern) => {
                let hit = pattern.is_match(haystack);
                self.patterns.write().insert(phrase.to_string(), pattern);
                hit
            }
            Err(e) => {
                warn!("Cannot compile pattern for phrase '{phrase}': {e}");
                false
            }
        }
    }

    /// Serialize the matcher into an opaque blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = MatcherSnapshot {
            strategy: self.strategy,
            entities: self.entities.clone(),
            pending: self.pending.lock().clone(),
            ignore_list: self.ignore_list.clone(),
        };

        let payload = bincode::serde::encode_to_vec(&snapshot, bincode::config::standard())
            .map_err(|e| HarkError::serialization(format!("Failed to encode matcher: {e}")))?;

        let mut bytes = Vec::with_capacity(payload.len() + 6);
        bytes.extend_from_slice(BLOB_MAGIC);
        bytes.extend_from_slice(&BLOB_VERSION);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Rebuild a matcher from a blob produced by [`EntityMatcher::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 6 || &bytes[..4] != BLOB_MAGIC {
            return Err(HarkError::serialization("Invalid entity matcher blob"));
        }
        if bytes[4] != BLOB_VERSION[0] {
            return Err(HarkError::serialization(format!(
                "Unsupported entity matcher blob version: {}.{}",
                bytes[4], bytes[5]
            )));
        }

        let (snapshot, _): (MatcherSnapshot, _) =
            bincode::serde::decode_from_slice(&bytes[6..], bincode::config::standard())
                .map_err(|e| HarkError::serialization(format!("Failed to decode matcher: {e}")))?;

        if !snapshot.strategy.is_available() {
            return Err(HarkError::configuration(format!(
                "saved matcher uses strategy {:?}, which this build does not provide",
                snapshot.strategy
            )));
        }

        Ok(Self::with_parts(
            snapshot.strategy,
            snapshot.ignore_list,
            snapshot.entities,
        ))
    }

    /// Write the matcher state to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Replace the whole in-memory state with the one stored at `path`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = fs::read(path)?;
        *self = Self::from_bytes(&bytes)?;
        Ok(())
    }

    /// Register entities from a CSV file.
    ///
    /// The first row is a header. Every other row is `entity,phrase`; commas
    /// after the first one belong to the phrase. Returns what was loaded.
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<BTreeMap<String, Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut loaded: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            if record.len() < 2 {
                continue;
            }
            let phrase = record.iter().skip(1).collect::<Vec<_>>().join(",");
            loaded.entry(record[0].to_string()).or_default().push(phrase);
        }

        for (name, phrases) in &loaded {
            self.register(name, phrases.iter().cloned());
        }
        debug!("Loaded {} entities from CSV", loaded.len());
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_and_color(mut matcher: EntityMatcher) -> EntityMatcher {
        matcher.register("fruit", ["apple", "banana", "cherry"]);
        matcher.register("color", ["red", "green", "blue"]);
        matcher
    }

    #[test]
    fn test_extract_longest_per_entity() {
        let matcher = fruit_and_color(EntityMatcher::naive());
        let extracted = matcher.extract("I have a red apple");

        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted["fruit"], "apple");
        assert_eq!(extracted["color"], "red");
    }

    #[test]
    fn test_longest_phrase_wins_ties_first_seen() {
        let mut matcher = EntityMatcher::naive();
        matcher.register("city", ["york", "new york", "yrk"]);
        matcher.register("size", ["big", "bag"]);

        let extracted = matcher.extract("a big bag in new york");
        assert_eq!(extracted["city"], "new york");
        assert_eq!(extracted["size"], "big");
    }

    #[test]
    fn test_one_hot_encode_layout() {
        let matcher = fruit_and_color(EntityMatcher::naive());
        assert_eq!(matcher.labels(), vec!["color", "fruit"]);

        assert_eq!(matcher.one_hot_encode("red apple"), vec![1.0, 1.0]);
        assert_eq!(matcher.one_hot_encode("not banana"), vec![0.0, 1.0]);
        assert_eq!(matcher.one_hot_encode("green not"), vec![1.0, 0.0]);
        assert_eq!(matcher.one_hot_encode(""), vec![0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_length_tracks_entity_set() {
        let mut matcher = fruit_and_color(EntityMatcher::naive());
        assert_eq!(matcher.one_hot_encode("anything").len(), 2);

        matcher.register("animal", ["cat"]);
        assert_eq!(matcher.one_hot_encode("anything").len(), 3);

        matcher.deregister("fruit");
        matcher.deregister("unknown");
        assert_eq!(matcher.one_hot_encode("anything").len(), 2);
    }

    #[test]
    fn test_naive_is_case_sensitive_and_whole_word() {
        let matcher = fruit_and_color(EntityMatcher::naive());

        assert!(matcher.extract("RED APPLE").is_empty());
        assert!(matcher.extract("pineapples are bluer").is_empty());
        assert_eq!(matcher.extract("apple!")["fruit"], "apple");
    }

    #[test]
    fn test_short_phrases_are_ignored() {
        let mut matcher = EntityMatcher::naive();
        matcher.register("word", ["a", "me", "joke"]);

        let values: Vec<String> = matcher.matches("tell me a joke").map(|m| m.value).collect();
        assert_eq!(values, vec!["joke"]);
    }

    #[test]
    fn test_ignore_list_applies_to_name_entities() {
        let config = MatcherConfig::default().with_ignore_list(["Bob"]);
        let mut matcher = EntityMatcher::new(config).unwrap();
        matcher.register("first_name", ["bob", "alice"]);
        matcher.register("nickname", ["bob"]);

        let extracted = matcher.extract("bob and alice");
        assert_eq!(extracted["first_name"], "alice");
        assert_eq!(extracted["nickname"], "bob");
    }

    #[test]
    fn test_duplicates_are_reported_per_registration() {
        let mut matcher = EntityMatcher::naive();
        matcher.register("color", ["red"]);
        matcher.register("color", ["red"]);

        assert_eq!(matcher.phrases("color").unwrap().len(), 2);
        assert_eq!(matcher.matches("red").count(), 2);
    }

    #[test]
    fn test_reset() {
        let mut matcher = fruit_and_color(EntityMatcher::naive());
        matcher.reset();
        assert!(matcher.is_empty());
        assert!(matcher.one_hot_encode("red apple").is_empty());
    }

    #[test]
    fn test_bytes_round_trip() {
        let config = MatcherConfig::default().with_ignore_list(["the"]);
        let matcher = fruit_and_color(EntityMatcher::new(config).unwrap());
        let queries = ["I have a red apple", "green banana", "nothing here"];

        let restored = EntityMatcher::from_bytes(&matcher.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.strategy(), MatchStrategy::Naive);
        assert_eq!(restored.ignore_list(), matcher.ignore_list());
        for query in queries {
            assert_eq!(restored.extract(query), matcher.extract(query));
            assert_eq!(
                restored.matches(query).collect::<Vec<_>>(),
                matcher.matches(query).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(EntityMatcher::from_bytes(b"nope").is_err());
        assert!(EntityMatcher::from_bytes(b"HKEM\x09\x00").is_err());
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.csv");
        std::fs::write(
            &path,
            "entity,sample\ncolor,red\ncolor,dark blue\ncity,Washington, D.C.\nbroken\n",
        )
        .unwrap();

        let mut matcher = EntityMatcher::naive();
        let loaded = matcher.load_csv(&path).unwrap();

        assert_eq!(loaded["color"], vec!["red", "dark blue"]);
        assert_eq!(loaded["city"], vec!["Washington, D.C."]);
        assert_eq!(matcher.labels(), vec!["city", "color"]);
        assert_eq!(matcher.extract("paint it dark blue")["color"], "dark blue");
    }

    #[cfg(feature = "automaton")]
    mod indexed {
        use super::*;

        #[test]
        fn test_indexed_lowercases_and_strips() {
            let matcher = fruit_and_color(EntityMatcher::indexed().unwrap());
            let extracted = matcher.extract("I have a RED Apple!");

            assert_eq!(extracted["fruit"], "apple");
            assert_eq!(extracted["color"], "red");
        }

        #[test]
        fn test_indexed_requires_trailing_boundary() {
            let matcher = fruit_and_color(EntityMatcher::indexed().unwrap());
            assert!(matcher.extract("reddish apples").is_empty());
        }

        #[test]
        fn test_index_rebuilt_after_registration() {
            let mut matcher = fruit_and_color(EntityMatcher::indexed().unwrap());
            assert!(matcher.extract("a purple plum").is_empty());

            matcher.register("color", ["purple"]);
            matcher.register("fruit", ["plum"]);
            let extracted = matcher.extract("a purple plum");
            assert_eq!(extracted["color"], "purple");
            assert_eq!(extracted["fruit"], "plum");
        }

        #[test]
        fn test_indexed_counts_duplicates_like_naive() {
            let mut indexed = EntityMatcher::indexed().unwrap();
            let mut naive = EntityMatcher::naive();
            for matcher in [&mut indexed, &mut naive] {
                matcher.register("color", ["red"]);
                matcher.register("color", ["red"]);
            }

            assert_eq!(indexed.matches("red").count(), 2);
            assert_eq!(
                indexed.matches("red").collect::<Vec<_>>(),
                naive.matches("red").collect::<Vec<_>>()
            );
        }

        #[test]
        fn test_indexed_round_trip() {
            let matcher = fruit_and_color(EntityMatcher::indexed().unwrap());
            let before = matcher.extract("green banana");

            let restored = EntityMatcher::from_bytes(&matcher.to_bytes().unwrap()).unwrap();
            assert_eq!(restored.strategy(), MatchStrategy::Indexed);
            assert_eq!(restored.extract("green banana"), before);
        }
    }

    #[cfg(not(feature = "automaton"))]
    #[test]
    fn test_indexed_unavailable_fails_at_construction() {
        let err = EntityMatcher::indexed().unwrap_err();
        assert!(matches!(err, HarkError::Configuration(_)));
    }
}
