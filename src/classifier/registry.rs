//! All labels' binary classifiers and cross-label negative mining.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::classifier::binary::{AdaptiveBinaryClassifier, TrainingState};
use crate::classifier::config::ClassifierConfig;
use crate::error::{HarkError, Result};

/// Owns one [`AdaptiveBinaryClassifier`] per label.
///
/// Every label's positives are the negatives of every other label. Mining
/// (and, in eager mode, fitting) runs as one task per label on the
/// registry's thread pool while the label map is write-locked.
pub struct LabelRegistry {
    config: ClassifierConfig,
    labels: RwLock<BTreeMap<String, AdaptiveBinaryClassifier>>,
    /// Set by every label mutation, cleared by a successful [`LabelRegistry::train`].
    dirty: AtomicBool,
    /// Set when the last [`LabelRegistry::train`] had too few labels.
    skipped: AtomicBool,
    pool: ThreadPool,
}

impl std::fmt::Debug for LabelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRegistry")
            .field("labels", &self.labels())
            .field("dirty", &self.is_dirty())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl LabelRegistry {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let num_threads = config.num_threads.unwrap_or_else(num_cpus::get);
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("hark-train-{i}"))
            .build()
            .map_err(|e| HarkError::configuration(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            config,
            labels: RwLock::new(BTreeMap::new()),
            dirty: AtomicBool::new(false),
            skipped: AtomicBool::new(false),
            pool,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Sorted label names.
    pub fn labels(&self) -> Vec<String> {
        self.labels.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.labels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.read().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.read().contains_key(name)
    }

    /// Whether labels changed since the last successful training.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Whether the last training attempt was skipped for lack of labels.
    pub fn training_skipped(&self) -> bool {
        self.skipped.load(Ordering::Acquire)
    }

    /// Training state of one label.
    pub fn state(&self, name: &str) -> Option<TrainingState> {
        self.labels.read().get(name).map(|clf| clf.state())
    }

    pub fn positives(&self, name: &str) -> Option<Vec<String>> {
        self.labels.read().get(name).map(|clf| clf.positives().to_vec())
    }

    pub fn negatives(&self, name: &str) -> Option<Vec<String>> {
        self.labels.read().get(name).map(|clf| clf.negatives().to_vec())
    }

    /// Add positive examples to `name`, creating the label if needed.
    pub fn add_label<I, S>(&self, name: &str, examples: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels = self.labels.write();
        let clf = labels
            .entry(name.to_string())
            .or_insert_with(|| AdaptiveBinaryClassifier::new(&self.config));
        clf.add_positive(examples)?;
        self.dirty.store(true, Ordering::Release);

        if self.config.eager {
            clf.ensure_trained()?;
        }
        Ok(())
    }

    /// Drop the label `name`. Returns whether it existed.
    pub fn remove_label(&self, name: &str) -> bool {
        let removed = self.labels.write().remove(name).is_some();
        if removed {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    /// Mine negatives for every label from every other label's positives,
    /// refitting each label in eager mode.
    ///
    /// With fewer than `min_labels` labels this only logs, warning once until
    /// a later call trains. Every task runs to completion; the first failure
    /// is returned afterwards.
    pub fn train(&self) -> Result<()> {
        let mut labels = self.labels.write();

        if labels.len() < self.config.min_labels {
            let reason = HarkError::insufficient_data(format!(
                "{} label(s) registered, at least {} needed to mine negatives",
                labels.len(),
                self.config.min_labels
            ));
            if self.skipped.swap(true, Ordering::AcqRel) {
                debug!("Skipping training: {reason}");
            } else {
                warn!("Skipping training: {reason}");
            }
            return Ok(());
        }
        self.skipped.store(false, Ordering::Release);

        let positives: Vec<(String, Vec<String>)> = labels
            .iter()
            .map(|(name, clf)| (name.clone(), clf.positives().to_vec()))
            .collect();
        let eager = self.config.eager;
        let classifiers: &mut BTreeMap<String, AdaptiveBinaryClassifier> = &mut labels;

        let outcomes: Vec<(String, Result<()>)> = self.pool.install(|| {
            classifiers
                .par_iter_mut()
                .map(|(name, clf)| {
                    let mined = positives
                        .iter()
                        .filter(|(other, _)| other != name)
                        .flat_map(|(_, examples)| examples.iter().cloned());
                    clf.add_negative(mined);

                    let outcome = if eager {
                        clf.ensure_trained().map(|_| ())
                    } else {
                        Ok(())
                    };
                    (name.clone(), outcome)
                })
                .collect()
        });

        if let Some((label, err)) = outcomes
            .into_iter()
            .find_map(|(label, outcome)| outcome.err().map(|err| (label, err)))
        {
            return Err(HarkError::task_failure(label, err));
        }

        self.dirty.store(false, Ordering::Release);
        info!("Trained {} label(s)", labels.len());
        Ok(())
    }

    /// Probability of every label for `utterance`.
    ///
    /// Trains first when the registry is dirty and has enough labels, then
    /// fits any label whose model is stale. Labels that still cannot be
    /// trained report `0.0`.
    pub fn predict(&self, utterance: &str) -> Result<BTreeMap<String, f64>> {
        if self.is_dirty() && self.len() >= self.config.min_labels {
            self.train()?;
        }

        let labels = self.labels.upgradable_read();
        let labels = if labels.values().any(AdaptiveBinaryClassifier::needs_training) {
            let mut labels = RwLockUpgradableReadGuard::upgrade(labels);
            for (name, clf) in labels.iter_mut() {
                clf.ensure_trained()
                    .map_err(|err| HarkError::task_failure(name.clone(), err))?;
            }
            RwLockWriteGuard::downgrade(labels)
        } else {
            RwLockUpgradableReadGuard::downgrade(labels)
        };

        let mut probabilities = BTreeMap::new();
        for (name, clf) in labels.iter() {
            let probability = match clf.probability(utterance) {
                Ok(probability) => probability,
                Err(HarkError::Untrainable(reason)) => {
                    debug!("Label '{name}' cannot be trained yet ({reason}); reporting 0.0");
                    0.0
                }
                Err(err) => return Err(err),
            };
            probabilities.insert(name.clone(), probability);
        }
        Ok(probabilities)
    }
}
