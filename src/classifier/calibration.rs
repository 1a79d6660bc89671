//! Platt scaling: turns decision values into probabilities.

use crate::classifier::model::{
    ClassProbabilities, DecisionClassifier, ProbabilisticClassifier, TrainingLabel,
};
use crate::error::Result;

const MAX_NEWTON_ITERATIONS: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPSILON: f64 = 1e-5;

/// A [`DecisionClassifier`] with a sigmoid fitted on its decision values.
///
/// `P(intent | f) = 1 / (1 + exp(a * f + b))`, where `a` and `b` minimize the
/// log loss against regularized targets on the training set.
#[derive(Debug, Clone)]
pub struct Calibrated<M> {
    model: M,
    a: f64,
    b: f64,
    fitted: bool,
}

impl<M: DecisionClassifier> Calibrated<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            a: 0.0,
            b: 0.0,
            fitted: false,
        }
    }

    /// The wrapped model.
    pub fn inner(&self) -> &M {
        &self.model
    }

    /// Sigmoid parameters `(a, b)`.
    pub fn parameters(&self) -> (f64, f64) {
        (self.a, self.b)
    }
}

impl<M: DecisionClassifier> ProbabilisticClassifier for Calibrated<M> {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[TrainingLabel]) -> Result<()> {
        self.model.fit(features, labels)?;

        let decisions = features
            .iter()
            .map(|row| self.model.decision_function(row))
            .collect::<Result<Vec<f64>>>()?;

        let (a, b) = fit_sigmoid(&decisions, labels);
        self.a = a;
        self.b = b;
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities> {
        let decision = self.model.decision_function(features)?;
        Ok(ClassProbabilities::from_intent(platt_probability(
            decision * self.a + self.b,
        )))
    }

    fn is_fitted(&self) -> bool {
        self.fitted && self.model.is_fitted()
    }

    fn name(&self) -> &str {
        self.model.name()
    }
}

/// `1 / (1 + exp(f_apb))` without overflow.
fn platt_probability(f_apb: f64) -> f64 {
    if f_apb >= 0.0 {
        let e = (-f_apb).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + f_apb.exp())
    }
}

/// Newton's method with backtracking line search for Platt's sigmoid.
fn fit_sigmoid(decisions: &[f64], labels: &[TrainingLabel]) -> (f64, f64) {
    let positives = labels.iter().filter(|l| **l == TrainingLabel::Intent).count() as f64;
    let negatives = labels.len() as f64 - positives;

    let hi_target = (positives + 1.0) / (positives + 2.0);
    let lo_target = 1.0 / (negatives + 2.0);
    let targets: Vec<f64> = labels
        .iter()
        .map(|label| match label {
            TrainingLabel::Intent => hi_target,
            TrainingLabel::NotIntent => lo_target,
        })
        .collect();

    let objective = |a: f64, b: f64| -> f64 {
        decisions
            .iter()
            .zip(&targets)
            .map(|(f, t)| {
                let f_apb = f * a + b;
                if f_apb >= 0.0 {
                    t * f_apb + (1.0 + (-f_apb).exp()).ln()
                } else {
                    (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((negatives + 1.0) / (positives + 1.0)).ln();
    let mut value = objective(a, b);

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);

        for (f, t) in decisions.iter().zip(&targets) {
            let p = platt_probability(f * a + b);
            let q = 1.0 - p;
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPSILON && g2.abs() < EPSILON {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (new_a, new_b) = (a + step * da, b + step * db);
            let new_value = objective(new_a, new_b);
            if new_value < value + 1e-4 * step * gd {
                a = new_a;
                b = new_b;
                value = new_value;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            break;
        }
    }

    (a, b)
}
