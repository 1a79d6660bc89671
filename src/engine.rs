//! The intent engine: registration and confidence-fused prediction.
//!
//! [`IntentEngine`] ties the pieces together. Each intent is a label of the
//! [`LabelRegistry`]; intents registered with templates also own a
//! [`TemplateMatcher`], and intents with entity samples own an
//! [`EntityMatcher`] for keyword slots. [`IntentEngine::predict`] ranks every
//! intent by classifier probability adjusted by the matchers' evidence.
//!
//! # Example
//!
//! ```
//! use hark::engine::{EngineConfig, IntentEngine};
//!
//! let mut engine = IntentEngine::new(EngineConfig::default()).unwrap();
//! engine.register_intent("hello", ["hello world", "hey there", "hello"], None).unwrap();
//! engine.register_intent("joke", ["tell me a joke", "say a joke", "make me laugh"], None).unwrap();
//! engine
//!     .register_intent(
//!         "weather",
//!         ["how is the weather", "what's the weather like", "what is the weather outside"],
//!         None,
//!     )
//!     .unwrap();
//!
//! let best = engine.calc_intent("tell me a joke").unwrap().unwrap();
//! assert_eq!(best.name, "joke");
//! ```

pub mod config;
pub mod fusion;
pub mod types;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use log::{debug, info, warn};

use crate::classifier::LabelRegistry;
use crate::engine::fusion::{TemplateOutcome, fuse};
use crate::entity::EntityMatcher;
use crate::error::{HarkError, Result};
use crate::template::{TemplateMatcher, expand_grammar, is_template};

pub use config::{EngineConfig, FusionConfig, TierThresholds};
pub use types::{ConfidenceTier, IntentFilter, IntentMatch, UtteranceMatch, skill_id};

/// Entity name to candidate values.
pub type EntitySamples = BTreeMap<String, Vec<String>>;

/// Incremental intent classifier with slot filling.
#[derive(Debug)]
pub struct IntentEngine {
    config: EngineConfig,
    registry: LabelRegistry,
    keywords: BTreeMap<String, EntityMatcher>,
    templates: BTreeMap<String, TemplateMatcher>,
}

impl IntentEngine {
    /// Create an engine.
    ///
    /// Fails when the keyword matching strategy is not available in this
    /// build or the training pool cannot be created.
    pub fn new(config: EngineConfig) -> Result<Self> {
        if !config.matcher.strategy.is_available() {
            return Err(HarkError::configuration(format!(
                "matching strategy {:?} is not available; enable the `automaton` feature",
                config.matcher.strategy
            )));
        }

        let registry = LabelRegistry::new(config.classifier.clone())?;
        Ok(Self {
            config,
            registry,
            keywords: BTreeMap::new(),
            templates: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    /// Registered intent names, sorted.
    pub fn intents(&self) -> Vec<String> {
        self.registry.labels()
    }

    /// Keyword matcher of `intent`, if it has one.
    pub fn keyword_matcher(&self, intent: &str) -> Option<&EntityMatcher> {
        self.keywords.get(intent)
    }

    /// Template matcher of `intent`, if it has one.
    pub fn template_matcher(&self, intent: &str) -> Option<&TemplateMatcher> {
        self.templates.get(intent)
    }

    /// Register (or extend) an intent.
    ///
    /// Samples containing both `{` and `}` are templates. Every sample is
    /// grammar-expanded first. For each entity in `entity_samples`, every
    /// template referencing `{entity}` yields one extra positive per value,
    /// and the values are registered in the intent's keyword matcher.
    pub fn register_intent<I, S>(
        &mut self,
        name: &str,
        samples: I,
        entity_samples: Option<&EntitySamples>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expanded: Vec<String> = samples
            .into_iter()
            .flat_map(|sample| expand_grammar(sample.as_ref()))
            .filter(|sample| !sample.is_empty())
            .collect();
        let templates: Vec<String> = expanded
            .iter()
            .filter(|sample| is_template(sample))
            .cloned()
            .collect();

        let mut positives = expanded;
        if !templates.is_empty() {
            self.templates
                .entry(name.to_string())
                .or_insert_with(|| TemplateMatcher::new(self.config.template.clone()))
                .add_templates(&templates)?;

            if let Some(entities) = entity_samples {
                for (entity, values) in entities {
                    positives.extend(synthesize(&templates, entity, values));
                }
            }
        }

        debug!(
            "Registering intent '{name}' with {} positive(s), {} template(s)",
            positives.len(),
            templates.len()
        );
        self.registry.add_label(name, positives)?;

        if let Some(entities) = entity_samples {
            for (entity, values) in entities {
                self.keyword_matcher_mut(name)?
                    .register(entity, values.iter().cloned());
            }
        }
        Ok(())
    }

    /// Drop an intent with its classifier and matchers. Unknown names are ignored.
    pub fn remove_intent(&mut self, name: &str) {
        let removed = self.registry.remove_label(name);
        self.keywords.remove(name);
        self.templates.remove(name);
        if removed {
            debug!("Removed intent '{name}'");
        }
    }

    /// Register entity values for one intent, or for every intent when
    /// `intent` is `None`. Unknown intents are ignored.
    ///
    /// Templates of the affected intents that reference `{name}` also yield
    /// new positives.
    pub fn register_entity<I, S>(&mut self, name: &str, samples: I, intent: Option<&str>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = samples.into_iter().map(Into::into).collect();
        let targets = match intent {
            Some(intent) if self.registry.contains(intent) => vec![intent.to_string()],
            Some(intent) => {
                debug!("Ignoring entity '{name}' for unknown intent '{intent}'");
                return Ok(());
            }
            None => self.registry.labels(),
        };

        for target in targets {
            self.keyword_matcher_mut(&target)?
                .register(name, values.iter().cloned());

            let synthetic = match self.templates.get(&target) {
                Some(matcher) => {
                    let templates: Vec<String> = matcher.templates().map(str::to_string).collect();
                    synthesize(&templates, name, &values)
                }
                None => Vec::new(),
            };
            if !synthetic.is_empty() {
                debug!(
                    "Entity '{name}' adds {} positive(s) to '{target}'",
                    synthetic.len()
                );
                self.registry.add_label(&target, synthetic)?;
            }
        }
        Ok(())
    }

    /// Remove an entity from one intent's keyword matcher, or from all of them.
    pub fn remove_entity(&mut self, name: &str, intent: Option<&str>) {
        match intent {
            Some(intent) => {
                if let Some(matcher) = self.keywords.get_mut(intent) {
                    matcher.deregister(name);
                }
            }
            None => {
                for matcher in self.keywords.values_mut() {
                    matcher.deregister(name);
                }
            }
        }
    }

    /// Remove every intent and entity whose name starts with `{skill}:`.
    ///
    /// Returns the removed intent names.
    pub fn remove_skill(&mut self, skill: &str) -> Vec<String> {
        let prefix = format!("{skill}:");
        let intents: Vec<String> = self
            .registry
            .labels()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect();
        for intent in &intents {
            self.remove_intent(intent);
        }

        for matcher in self.keywords.values_mut() {
            let entities: Vec<String> = matcher
                .labels()
                .into_iter()
                .filter(|name| name.starts_with(&prefix))
                .collect();
            for entity in entities {
                matcher.deregister(&entity);
            }
        }

        info!("Detached skill '{skill}' ({} intent(s))", intents.len());
        intents
    }

    /// Mine negatives and (in eager mode) fit every intent.
    ///
    /// A no-op while nothing changed since the last call.
    pub fn train(&self) -> Result<()> {
        if !self.registry.is_dirty() {
            return Ok(());
        }
        self.registry.train()
    }

    /// The `top_n` best intents for `utterance`.
    ///
    /// Ties in confidence are ordered by intent name.
    pub fn predict(&self, utterance: &str, top_n: usize) -> Result<Vec<IntentMatch>> {
        let probabilities = self.registry.predict(utterance)?;

        let mut matches: Vec<IntentMatch> = probabilities
            .into_iter()
            .map(|(name, probability)| {
                let keyword_slots = self
                    .keywords
                    .get(&name)
                    .map(|matcher| matcher.extract(utterance))
                    .unwrap_or_default();
                let outcome = match self.templates.get(&name) {
                    Some(matcher) if !matcher.is_empty() => matcher
                        .best_slots(utterance)
                        .map_or(TemplateOutcome::Unmatched, TemplateOutcome::Matched),
                    _ => TemplateOutcome::NotTemplated,
                };

                let (confidence, slots) =
                    fuse(probability, keyword_slots, outcome, &self.config.fusion);
                IntentMatch {
                    name,
                    slots,
                    confidence,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.name.cmp(&b.name))
        });
        matches.truncate(top_n);
        Ok(matches)
    }

    /// The single best intent, if any intent is registered.
    pub fn calc_intent(&self, utterance: &str) -> Result<Option<IntentMatch>> {
        Ok(self.predict(utterance, 1)?.into_iter().next())
    }

    /// The best intent across several phrasings of one request.
    pub fn calc_best<S: AsRef<str>>(&self, utterances: &[S]) -> Result<Option<UtteranceMatch>> {
        self.calc_best_filtered(utterances, &IntentFilter::default())
    }

    /// Like [`IntentEngine::calc_best`], skipping intents rejected by `filter`.
    ///
    /// Utterances with `max_words` words or more are ignored. The first
    /// utterance wins among equally confident matches.
    pub fn calc_best_filtered<S: AsRef<str>>(
        &self,
        utterances: &[S],
        filter: &IntentFilter,
    ) -> Result<Option<UtteranceMatch>> {
        let candidates: Vec<&str> = utterances
            .iter()
            .map(AsRef::as_ref)
            .filter(|utterance| utterance.split_whitespace().count() < self.config.max_words)
            .collect();
        if candidates.is_empty() {
            warn!(
                "No utterance shorter than {} words; skipping intent matching",
                self.config.max_words
            );
            return Ok(None);
        }

        let mut best: Option<UtteranceMatch> = None;
        for utterance in candidates {
            let found = self
                .predict(utterance, self.config.top_n)?
                .into_iter()
                .find(|intent| filter.allows(intent));
            let Some(intent) = found else {
                continue;
            };
            debug!("'{utterance}' -> {} ({:.3})", intent.name, intent.confidence);

            let better = best
                .as_ref()
                .is_none_or(|current| intent.confidence > current.intent.confidence);
            if better {
                best = Some(UtteranceMatch {
                    utterance: utterance.to_string(),
                    intent,
                });
            }
        }
        Ok(best)
    }

    /// The best match when its confidence is above the `tier` threshold.
    pub fn match_tier<S: AsRef<str>>(
        &self,
        utterances: &[S],
        tier: ConfidenceTier,
    ) -> Result<Option<UtteranceMatch>> {
        let limit = self.config.tiers.threshold(tier);
        Ok(self
            .calc_best(utterances)?
            .filter(|best| best.intent.confidence > limit))
    }

    fn keyword_matcher_mut(&mut self, intent: &str) -> Result<&mut EntityMatcher> {
        match self.keywords.entry(intent.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(EntityMatcher::new(self.config.matcher.clone())?)),
        }
    }
}

/// Substitute every value of `entity` into each template that references it.
fn synthesize(templates: &[String], entity: &str, values: &[String]) -> Vec<String> {
    let placeholder = format!("{{{entity}}}");
    let placeholder = placeholder.as_str();
    templates
        .iter()
        .filter(|template| template.contains(placeholder))
        .flat_map(|template| {
            values
                .iter()
                .map(move |value| template.replace(placeholder, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierConfig;

    fn engine() -> IntentEngine {
        IntentEngine::new(EngineConfig {
            classifier: ClassifierConfig {
                seed: Some(42),
                num_threads: Some(2),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn colors() -> EntitySamples {
        EntitySamples::from([(
            "color".to_string(),
            vec!["red".to_string(), "green".to_string(), "blue".to_string()],
        )])
    }

    fn with_basic_intents(engine: &mut IntentEngine) {
        engine
            .register_intent("hello", ["hello world", "hey there", "hello"], None)
            .unwrap();
        engine
            .register_intent("joke", ["tell me a joke", "say a joke", "make me laugh"], None)
            .unwrap();
        engine
            .register_intent(
                "weather",
                [
                    "how is the weather",
                    "what's the weather like",
                    "what is the weather outside",
                ],
                None,
            )
            .unwrap();
    }

    #[test]
    fn test_synthesize() {
        let templates = vec![
            "change light to {color}".to_string(),
            "my name is {name}".to_string(),
        ];
        let values = vec!["red".to_string(), "blue".to_string()];
        assert_eq!(
            synthesize(&templates, "color", &values),
            vec!["change light to red", "change light to blue"]
        );
        assert!(synthesize(&templates, "size", &values).is_empty());
    }

    #[test]
    fn test_register_intent_with_templates() {
        let mut engine = engine();
        engine
            .register_intent(
                "color",
                ["change the color to {color}", "set light to {color}", "paint it"],
                Some(&colors()),
            )
            .unwrap();

        let positives = engine.registry().positives("color").unwrap();
        assert!(positives.contains(&"paint it".to_string()));
        assert!(positives.contains(&"change the color to {color}".to_string()));
        assert!(positives.contains(&"set light to green".to_string()));
        assert_eq!(positives.len(), 3 + 6);

        assert_eq!(engine.template_matcher("color").unwrap().len(), 2);
        assert_eq!(
            engine.keyword_matcher("color").unwrap().labels(),
            vec!["color"]
        );
    }

    #[test]
    fn test_register_intent_expands_grammar() {
        let mut engine = engine();
        engine
            .register_intent("introduce", ["[hello,] (call me|my name is) {name}"], None)
            .unwrap();

        assert_eq!(engine.registry().positives("introduce").unwrap().len(), 4);
        assert_eq!(engine.template_matcher("introduce").unwrap().len(), 4);
    }

    #[test]
    fn test_predict_end_to_end() {
        let mut engine = engine();
        with_basic_intents(&mut engine);

        let best = engine.calc_intent("tell me a joke").unwrap().unwrap();
        assert_eq!(best.name, "joke");
        assert!(best.slots.is_empty());

        let ranked = engine.predict("what is the weather", 3).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].name, "weather");
        assert!(ranked.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_template_slots_in_prediction() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine
            .register_intent("introduce", ["my name is {name}", "call me {name}"], None)
            .unwrap();

        let ranked = engine.predict("call me Casimiro", 5).unwrap();
        let introduce = ranked.iter().find(|m| m.name == "introduce").unwrap();
        assert_eq!(introduce.slots["name"], "Casimiro");

        // Without a structural match the templated intent is penalized.
        let ranked = engine.predict("tell me a joke", 5).unwrap();
        let introduce = ranked.iter().find(|m| m.name == "introduce").unwrap();
        assert!(introduce.slots.is_empty());
    }

    #[test]
    fn test_ties_break_by_name() {
        let mut engine = engine();
        engine.register_intent("b", ["bravo"], None).unwrap();
        engine.register_intent("a", ["alpha"], None).unwrap();

        // Two labels never train, so both report 0.0.
        let ranked = engine.predict("anything", 3).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "a");
        assert_eq!(ranked[0].confidence, 0.0);
        assert_eq!(ranked[1].name, "b");
    }

    #[test]
    fn test_register_and_remove_entity() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine
            .register_intent("color", ["set light to {color}"], None)
            .unwrap();

        engine
            .register_entity("color", ["red", "blue"], Some("color"))
            .unwrap();
        let positives = engine.registry().positives("color").unwrap();
        assert!(positives.contains(&"set light to red".to_string()));
        assert_eq!(
            engine.keyword_matcher("color").unwrap().extract("red please")["color"],
            "red"
        );

        engine.register_entity("planet", ["mars"], None).unwrap();
        for intent in engine.intents() {
            assert!(engine.keyword_matcher(&intent).unwrap().contains("planet"));
        }

        engine.remove_entity("planet", None);
        engine.remove_entity("color", Some("color"));
        engine.remove_entity("unknown", Some("nope"));
        assert!(engine.keyword_matcher("color").unwrap().is_empty());
    }

    #[test]
    fn test_remove_intent() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine
            .register_intent("color", ["set light to {color}"], Some(&colors()))
            .unwrap();

        engine.remove_intent("color");
        engine.remove_intent("never-registered");

        assert_eq!(engine.intents(), vec!["hello", "joke", "weather"]);
        assert!(engine.keyword_matcher("color").is_none());
        assert!(engine.template_matcher("color").is_none());
    }

    #[test]
    fn test_extended_intent_keeps_examples_disjoint() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine.train().unwrap();
        assert!(engine
            .registry()
            .negatives("joke")
            .unwrap()
            .contains(&"hello world".to_string()));

        engine.register_intent("joke", ["hello world"], None).unwrap();
        engine.train().unwrap();

        for intent in engine.intents() {
            let positives = engine.registry().positives(&intent).unwrap();
            let negatives = engine.registry().negatives(&intent).unwrap();
            assert!(
                negatives.iter().all(|n| !positives.contains(n)),
                "'{intent}' has an example on both sides"
            );
        }
    }

    #[test]
    fn test_intent_without_samples_mines_no_negatives() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine
            .register_intent("empty", Vec::<&str>::new(), None)
            .unwrap();
        engine.train().unwrap();

        assert!(engine.registry().positives("empty").unwrap().is_empty());
        assert!(engine.registry().negatives("empty").unwrap().is_empty());

        let ranked = engine.predict("tell me a joke", 4).unwrap();
        let empty = ranked.iter().find(|m| m.name == "empty").unwrap();
        assert_eq!(empty.confidence, 0.0);
    }

    #[test]
    fn test_entity_for_unknown_intent_is_ignored() {
        let mut engine = engine();
        with_basic_intents(&mut engine);

        engine
            .register_entity("color", ["red"], Some("never-registered"))
            .unwrap();

        assert!(engine.keyword_matcher("never-registered").is_none());
        assert!(!engine.registry().contains("never-registered"));
    }

    #[test]
    fn test_remove_skill() {
        let mut engine = engine();
        with_basic_intents(&mut engine);
        engine
            .register_intent("lights.skill:on", ["turn on the light"], None)
            .unwrap();
        engine
            .register_intent("lights.skill:off", ["turn off the light"], None)
            .unwrap();
        engine
            .register_entity("lights.skill:room", ["kitchen"], Some("hello"))
            .unwrap();

        let removed = engine.remove_skill("lights.skill");
        assert_eq!(removed, vec!["lights.skill:off", "lights.skill:on"]);
        assert_eq!(engine.intents(), vec!["hello", "joke", "weather"]);
        assert!(!engine.keyword_matcher("hello").unwrap().contains("lights.skill:room"));
    }

    #[test]
    fn test_train_is_idempotent() {
        let mut engine = engine();
        with_basic_intents(&mut engine);

        engine.train().unwrap();
        assert!(!engine.registry().is_dirty());
        let negatives = engine.registry().negatives("joke").unwrap();

        engine.train().unwrap();
        assert_eq!(engine.registry().negatives("joke").unwrap(), negatives);
    }

    #[test]
    fn test_calc_best_skips_long_utterances() {
        let mut engine = IntentEngine::new(EngineConfig {
            max_words: 4,
            classifier: ClassifierConfig {
                seed: Some(42),
                num_threads: Some(1),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        with_basic_intents(&mut engine);

        assert!(engine.calc_best(&["tell me a joke"]).unwrap().is_none());

        let best = engine
            .calc_best(&["tell me a joke", "tell a joke"])
            .unwrap()
            .unwrap();
        assert_eq!(best.utterance, "tell a joke");
        assert_eq!(best.intent.name, "joke");
    }

    #[test]
    fn test_calc_best_filtered() {
        let mut engine = engine();
        with_basic_intents(&mut engine);

        let filter = IntentFilter {
            blocked_intents: ["joke".to_string()].into(),
            ..Default::default()
        };
        let best = engine
            .calc_best_filtered(&["tell me a joke"], &filter)
            .unwrap()
            .unwrap();
        assert_ne!(best.intent.name, "joke");
    }

    #[test]
    fn test_match_tier() {
        let mut engine = engine();
        with_basic_intents(&mut engine);

        let best = engine.calc_best(&["tell me a joke"]).unwrap().unwrap();
        let low = engine
            .match_tier(&["tell me a joke"], ConfidenceTier::Low)
            .unwrap();
        assert_eq!(low.is_some(), best.intent.confidence > 0.5);

        let strict = IntentEngine::new(EngineConfig {
            tiers: TierThresholds {
                high: 1.0,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert!(strict
            .match_tier(&["tell me a joke"], ConfidenceTier::High)
            .unwrap()
            .is_none());
    }
}
