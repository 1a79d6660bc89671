//! The classic perceptron. It has no probabilities of its own and is used
//! through [`Calibrated`](crate::classifier::calibration::Calibrated).

use serde::{Deserialize, Serialize};

use crate::classifier::model::{
    DecisionClassifier, TrainingLabel, check_width, dot, validate_training_set,
};
use crate::error::Result;

/// Hyperparameters for [`Perceptron`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptronConfig {
    /// Maximum number of passes over the training set.
    pub max_epochs: usize,
    /// Update step.
    pub learning_rate: f64,
}

impl Default for PerceptronConfig {
    fn default() -> Self {
        Self {
            max_epochs: 50,
            learning_rate: 1.0,
        }
    }
}

/// Linear perceptron with an intercept.
#[derive(Debug, Clone)]
pub struct Perceptron {
    config: PerceptronConfig,
    weights: Vec<f64>,
    bias: f64,
    fitted: bool,
}

impl Default for Perceptron {
    fn default() -> Self {
        Self::new(PerceptronConfig::default())
    }
}

impl Perceptron {
    pub fn new(config: PerceptronConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            bias: 0.0,
            fitted: false,
        }
    }
}

impl DecisionClassifier for Perceptron {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<()> {
        let width = validate_training_set(features, labels)?;

        let mut weights = vec![0.0; width];
        let mut bias = 0.0;

        for _ in 0..self.config.max_epochs {
            let mut mistakes = 0;
            for (row, label) in features.iter().zip(labels) {
                let y = label.sign();
                if y * (dot(&weights, row) + bias) <= 0.0 {
                    for (w, x) in weights.iter_mut().zip(row) {
                        *w += self.config.learning_rate * y * x;
                    }
                    bias += self.config.learning_rate * y;
                    mistakes += 1;
                }
            }
            if mistakes == 0 {
                break;
            }
        }

        self.weights = weights;
        self.bias = bias;
        self.fitted = true;
        Ok(())
    }

    fn decision_function(&self, features: &[f64]) -> Result<f64> {
        check_width(features, self.weights.len())?;
        Ok(dot(&self.weights, features) + self.bias)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn name(&self) -> &str {
        "perceptron"
    }
}
