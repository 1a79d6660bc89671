//! The trainable model capability behind every binary classifier.

use serde::{Deserialize, Serialize};

use crate::error::{HarkError, Result};

/// Class of one training row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingLabel {
    /// The utterance expresses the label's intent.
    Intent,
    /// The utterance belongs to some other label.
    NotIntent,
}

impl TrainingLabel {
    /// `1.0` for [`TrainingLabel::Intent`], `0.0` otherwise.
    pub fn target(&self) -> f64 {
        match self {
            TrainingLabel::Intent => 1.0,
            TrainingLabel::NotIntent => 0.0,
        }
    }

    /// `+1.0` for [`TrainingLabel::Intent`], `-1.0` otherwise.
    pub fn sign(&self) -> f64 {
        match self {
            TrainingLabel::Intent => 1.0,
            TrainingLabel::NotIntent => -1.0,
        }
    }
}

/// Probabilities of both classes; they sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub intent: f64,
    pub not_intent: f64,
}

impl ClassProbabilities {
    /// Build from the probability of the intent class.
    pub fn from_intent(intent: f64) -> Self {
        let intent = intent.clamp(0.0, 1.0);
        Self {
            intent,
            not_intent: 1.0 - intent,
        }
    }
}

/// A binary model that predicts class probabilities.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Fit the model from scratch.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<()>;

    /// Class probabilities for one feature vector.
    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities>;

    /// Whether [`ProbabilisticClassifier::fit`] has succeeded at least once.
    fn is_fitted(&self) -> bool;

    /// Get the name of this model (for debugging and logging).
    fn name(&self) -> &str;
}

/// A binary model that only produces a signed decision value.
///
/// Positive values lean towards [`TrainingLabel::Intent`]. Wrap such a model
/// in [`Calibrated`](crate::classifier::calibration::Calibrated) to obtain
/// probabilities.
pub trait DecisionClassifier: Send + Sync {
    /// Fit the model from scratch.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<()>;

    /// Signed distance to the decision boundary.
    fn decision_function(&self, features: &[f64]) -> Result<f64>;

    /// Whether [`DecisionClassifier::fit`] has succeeded at least once.
    fn is_fitted(&self) -> bool;

    /// Get the name of this model (for debugging and logging).
    fn name(&self) -> &str;
}

/// Check a training set and return its feature width.
pub(crate) fn validate_training_set(features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<usize> {
    if features.is_empty() {
        return Err(HarkError::model("cannot fit on an empty training set"));
    }
    if features.len() != labels.len() {
        return Err(HarkError::model(format!(
            "{} feature rows but {} labels",
            features.len(),
            labels.len()
        )));
    }

    let width = features[0].len();
    if let Some(row) = features.iter().position(|row| row.len() != width) {
        return Err(HarkError::model(format!(
            "row {row} has {} features, expected {width}",
            features[row].len()
        )));
    }
    Ok(width)
}

/// Check that `features` has the width a model was fitted with.
pub(crate) fn check_width(features: &[f64], expected: usize) -> Result<()> {
    if features.len() != expected {
        return Err(HarkError::model(format!(
            "expected {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

pub(crate) fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

/// Logistic function, stable for large magnitudes.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
