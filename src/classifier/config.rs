//! Configuration for binary classifiers and the label registry.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::calibration::Calibrated;
use crate::classifier::logistic::{LogisticRegression, LogisticRegressionConfig};
use crate::classifier::model::ProbabilisticClassifier;
use crate::classifier::perceptron::{Perceptron, PerceptronConfig};

/// Builds a fresh model for [`ModelConfig::Custom`].
#[derive(Clone)]
pub struct ModelFactory(Arc<dyn Fn() -> Box<dyn ProbabilisticClassifier> + Send + Sync>);

impl ModelFactory {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn ProbabilisticClassifier> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    pub fn build(&self) -> Box<dyn ProbabilisticClassifier> {
        (self.0)()
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModelFactory")
    }
}

impl PartialEq for ModelFactory {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// Which model every binary classifier trains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelConfig {
    /// Logistic regression; has native probabilities.
    LogisticRegression(LogisticRegressionConfig),
    /// Perceptron wrapped in Platt calibration.
    CalibratedPerceptron(PerceptronConfig),
    /// Any model built by a caller-supplied factory. Not serializable.
    #[serde(skip)]
    Custom(ModelFactory),
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::LogisticRegression(LogisticRegressionConfig::default())
    }
}

impl ModelConfig {
    /// Construct a fresh, unfitted model.
    pub fn build(&self) -> Box<dyn ProbabilisticClassifier> {
        match self {
            ModelConfig::LogisticRegression(config) => {
                Box::new(LogisticRegression::new(config.clone()))
            }
            ModelConfig::CalibratedPerceptron(config) => {
                Box::new(Calibrated::new(Perceptron::new(config.clone())))
            }
            ModelConfig::Custom(factory) => factory.build(),
        }
    }
}

/// Classifier and registry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A label keeps at most `negative_ratio × |positives|` negatives.
    pub negative_ratio: usize,
    /// Minimum number of labels before the registry mines negatives.
    pub min_labels: usize,
    /// Retrain on registration and during registry training instead of
    /// waiting for the first prediction.
    pub eager: bool,
    /// The model behind every label.
    pub model: ModelConfig,
    /// Seed for shuffling training rows; random when unset.
    pub seed: Option<u64>,
    /// Training thread pool size; one thread per CPU when unset.
    pub num_threads: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            negative_ratio: 3,
            min_labels: 3,
            eager: false,
            model: ModelConfig::default(),
            seed: None,
            num_threads: None,
        }
    }
}
