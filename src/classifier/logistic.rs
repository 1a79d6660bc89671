//! L2-regularized logistic regression trained by full-batch gradient descent.

use serde::{Deserialize, Serialize};

use crate::classifier::model::{
    ClassProbabilities, ProbabilisticClassifier, TrainingLabel, check_width, dot, sigmoid,
    validate_training_set,
};
use crate::error::Result;

/// Hyperparameters for [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionConfig {
    /// Gradient descent step size.
    pub learning_rate: f64,
    /// Maximum number of full passes over the training set.
    pub max_iterations: usize,
    /// L2 penalty on the weights (the intercept is not penalized).
    pub l2: f64,
    /// Stop once every gradient component is below this value.
    pub tolerance: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            max_iterations: 1000,
            l2: 0.01,
            tolerance: 1e-6,
        }
    }
}

/// Binary logistic regression with an intercept.
///
/// Training is deterministic: weights start at zero and every iteration uses
/// the whole training set.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
    weights: Vec<f64>,
    bias: f64,
    /// Iterations run by the last fit.
    iterations: usize,
    fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticRegressionConfig::default())
    }
}

impl LogisticRegression {
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            bias: 0.0,
            iterations: 0,
            fitted: false,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Iterations run by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<()> {
        let width = validate_training_set(features, labels)?;
        let n = features.len() as f64;

        let mut weights = vec![0.0; width];
        let mut bias = 0.0;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, label) in features.iter().zip(labels) {
                let error = sigmoid(dot(&weights, row) + bias) - label.target();
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += error * x;
                }
                grad_b += error;
            }

            let mut largest = (grad_b / n).abs();
            for (g, w) in grad_w.iter_mut().zip(&weights) {
                *g = *g / n + self.config.l2 * w;
                largest = largest.max(g.abs());
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= self.config.learning_rate * g;
            }
            bias -= self.config.learning_rate * grad_b / n;

            if largest < self.config.tolerance {
                break;
            }
        }

        self.weights = weights;
        self.bias = bias;
        self.iterations = iterations;
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities> {
        check_width(features, self.weights.len())?;
        Ok(ClassProbabilities::from_intent(sigmoid(
            dot(&self.weights, features) + self.bias,
        )))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
