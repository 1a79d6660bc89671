//! One label's binary classifier.

use std::fmt;

use ahash::AHashMap;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::analysis::token_texts;
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::classifier::config::{ClassifierConfig, ModelConfig};
use crate::classifier::model::{ProbabilisticClassifier, TrainingLabel};
use crate::entity::{EntityMatcher, FeatureVector};
use crate::error::{HarkError, Result};
use crate::util::fuzz::token_set_ratio;

/// Whether a classifier's model reflects its current examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingState {
    /// The model was fitted on the current examples.
    Clean,
    /// Examples or vocabulary changed since the last fit (or there was none).
    Dirty,
}

/// Binary classifier for one label.
///
/// The vocabulary is derived from the label's own positives: every token
/// becomes a single-phrase entity of a private naive [`EntityMatcher`], and
/// utterances are encoded as one-hot vectors over that vocabulary. Every
/// mutation marks the classifier [`TrainingState::Dirty`]; the model is
/// refitted from scratch on the next [`ensure_trained`](Self::ensure_trained).
pub struct AdaptiveBinaryClassifier {
    positives: Vec<String>,
    negatives: Vec<String>,
    /// Similarity of each negative to the first positive.
    similarity: AHashMap<String, f64>,
    featurizer: EntityMatcher,
    tokenizer: UnicodeWordTokenizer,
    model_config: ModelConfig,
    model: Option<Box<dyn ProbabilisticClassifier>>,
    state: TrainingState,
    negative_ratio: usize,
    seed: Option<u64>,
}

impl fmt::Debug for AdaptiveBinaryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveBinaryClassifier")
            .field("positives", &self.positives.len())
            .field("negatives", &self.negatives.len())
            .field("tokenizer", &self.tokenizer.name())
            .field("vocabulary", &self.featurizer.len())
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("state", &self.state)
            .finish()
    }
}

impl Default for AdaptiveBinaryClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl AdaptiveBinaryClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            positives: Vec::new(),
            negatives: Vec::new(),
            similarity: AHashMap::new(),
            featurizer: EntityMatcher::naive(),
            tokenizer: UnicodeWordTokenizer::new(),
            model_config: config.model.clone(),
            model: None,
            state: TrainingState::Dirty,
            negative_ratio: config.negative_ratio,
            seed: config.seed,
        }
    }

    pub fn positives(&self) -> &[String] {
        &self.positives
    }

    pub fn negatives(&self) -> &[String] {
        &self.negatives
    }

    /// Vocabulary terms, in feature order.
    pub fn vocabulary(&self) -> Vec<String> {
        self.featurizer.labels()
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Whether both example sets are non-empty.
    pub fn is_trainable(&self) -> bool {
        !self.positives.is_empty() && !self.negatives.is_empty()
    }

    /// Whether the next [`ensure_trained`](Self::ensure_trained) would fit.
    pub fn needs_training(&self) -> bool {
        self.state == TrainingState::Dirty && self.is_trainable()
    }

    /// Add positive examples and grow the vocabulary with their tokens.
    ///
    /// An example that was a negative of this label stops being one.
    pub fn add_positive<I, S>(&mut self, examples: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for example in examples {
            let example = example.into();
            for token in token_texts(&self.tokenizer, &example)? {
                if !self.featurizer.contains(&token) {
                    self.featurizer.register(&token, [token.as_str()]);
                }
            }
            self.negatives.retain(|negative| *negative != example);
            self.similarity.remove(&example);
            self.positives.push(example);
        }
        self.state = TrainingState::Dirty;
        Ok(())
    }

    /// Add negative examples that are not already positive or negative, then
    /// prune down to `negative_ratio × |positives|`.
    ///
    /// Pruning keeps the negatives least similar to the first positive.
    pub fn add_negative<I, S>(&mut self, examples: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.negatives.len();
        for example in examples {
            let example = example.into();
            if !self.positives.contains(&example) && !self.negatives.contains(&example) {
                self.negatives.push(example);
            }
        }
        if self.negatives.len() != before {
            self.state = TrainingState::Dirty;
        }

        let limit = self.negative_ratio * self.positives.len();
        if self.negatives.len() > limit {
            self.prune_negatives(limit);
        }
    }

    fn prune_negatives(&mut self, limit: usize) {
        let Some(reference) = self.positives.first() else {
            debug!("No positives to compare with; dropping {} negative(s)", self.negatives.len());
            self.negatives.truncate(limit);
            self.similarity.clear();
            return;
        };

        for negative in &self.negatives {
            if !self.similarity.contains_key(negative) {
                let score = token_set_ratio(negative, reference);
                self.similarity.insert(negative.clone(), score);
            }
        }

        let similarity = &self.similarity;
        self.negatives.sort_by(|a, b| {
            let a = similarity.get(a).copied().unwrap_or_default();
            let b = similarity.get(b).copied().unwrap_or_default();
            a.total_cmp(&b)
        });
        let dropped = self.negatives.len() - limit;
        self.negatives.truncate(limit);

        let kept = &self.negatives;
        self.similarity.retain(|negative, _| kept.contains(negative));
        debug!("Pruned {dropped} negative(s), keeping {limit}");
    }

    /// One-hot encode `utterance` over the current vocabulary.
    pub fn encode(&self, utterance: &str) -> FeatureVector {
        self.featurizer.one_hot_encode(utterance)
    }

    /// Fit a fresh model on the current examples.
    ///
    /// Does nothing while either example set is empty.
    pub fn train(&mut self) -> Result<()> {
        if !self.is_trainable() {
            debug!(
                "Not training: {} positive(s), {} negative(s)",
                self.positives.len(),
                self.negatives.len()
            );
            return Ok(());
        }

        let mut rows: Vec<(FeatureVector, TrainingLabel)> = self
            .positives
            .iter()
            .map(|example| (self.encode(example), TrainingLabel::Intent))
            .chain(
                self.negatives
                    .iter()
                    .map(|example| (self.encode(example), TrainingLabel::NotIntent)),
            )
            .collect();

        match self.seed {
            Some(seed) => rows.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => rows.shuffle(&mut rand::rng()),
        }
        let (features, labels): (Vec<FeatureVector>, Vec<TrainingLabel>) =
            rows.into_iter().unzip();

        let mut model = self.model_config.build();
        model.fit(&features, &labels)?;
        debug!(
            "Fitted {} on {} row(s) x {} feature(s)",
            model.name(),
            features.len(),
            self.featurizer.len()
        );

        self.model = Some(model);
        self.state = TrainingState::Clean;
        Ok(())
    }

    /// Train if dirty and trainable. Returns whether a fit happened.
    pub fn ensure_trained(&mut self) -> Result<bool> {
        if !self.needs_training() {
            return Ok(false);
        }
        self.train()?;
        Ok(true)
    }

    /// Probability that `utterance` belongs to this label, training first
    /// when needed.
    pub fn predict(&mut self, utterance: &str) -> Result<f64> {
        self.ensure_trained()?;
        self.probability(utterance)
    }

    /// Probability from the current model, without training.
    pub fn probability(&self, utterance: &str) -> Result<f64> {
        if !self.is_trainable() {
            return Err(HarkError::untrainable(format!(
                "{} positive(s) and {} negative(s)",
                self.positives.len(),
                self.negatives.len()
            )));
        }
        let Some(model) = &self.model else {
            return Err(HarkError::untrainable("no model has been fitted"));
        };

        Ok(model.predict_proba(&self.encode(utterance))?.intent)
    }

    /// Accuracy on held-out examples at a 0.5 threshold.
    ///
    /// `0.0` when the classifier is untrained or has an empty example set.
    pub fn score(&self, examples: &[(&str, TrainingLabel)]) -> Result<f64> {
        if !self.is_trainable() || self.model.is_none() || examples.is_empty() {
            return Ok(0.0);
        }

        let mut correct = 0;
        for (utterance, label) in examples {
            let predicted = if self.probability(utterance)? >= 0.5 {
                TrainingLabel::Intent
            } else {
                TrainingLabel::NotIntent
            };
            if predicted == *label {
                correct += 1;
            }
        }
        Ok(correct as f64 / examples.len() as f64)
    }
}
