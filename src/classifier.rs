//! Per-label binary classification.
//!
//! Each label owns an [`AdaptiveBinaryClassifier`] whose vocabulary comes
//! from the label's own positive phrasing. The [`LabelRegistry`] feeds every
//! label the positives of all other labels as negatives and trains them in
//! parallel. The model itself sits behind the [`ProbabilisticClassifier`]
//! trait; [`LogisticRegression`] is the default and [`Calibrated`] turns any
//! [`DecisionClassifier`] such as the [`Perceptron`] into one.

pub mod binary;
pub mod calibration;
pub mod config;
pub mod logistic;
pub mod model;
pub mod perceptron;
pub mod registry;

pub use binary::{AdaptiveBinaryClassifier, TrainingState};
pub use calibration::Calibrated;
pub use config::{ClassifierConfig, ModelConfig, ModelFactory};
pub use logistic::{LogisticRegression, LogisticRegressionConfig};
pub use model::{ClassProbabilities, DecisionClassifier, ProbabilisticClassifier, TrainingLabel};
pub use perceptron::{Perceptron, PerceptronConfig};
pub use registry::LabelRegistry;
