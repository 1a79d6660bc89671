//! Error types for the Hark library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`HarkError`] enum. Lookups of unknown labels or entities are not errors:
//! removals are no-ops and matching simply yields nothing.
//!
//! # Examples
//!
//! ```
//! use hark::error::{HarkError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(HarkError::configuration("indexed matching is not compiled in"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Hark operations.
#[derive(Error, Debug)]
pub enum HarkError {
    /// I/O errors (matcher blobs, CSV and JSON input files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A requested capability is unavailable or a configuration value is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Not enough labels or examples to train.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Prediction was requested from a classifier that still cannot be trained.
    #[error("Untrainable classifier: {0}")]
    Untrainable(String),

    /// A parallel per-label training task failed.
    #[error("Training task for label '{label}' failed: {source}")]
    TaskFailure {
        label: String,
        #[source]
        source: Box<HarkError>,
    },

    /// The classification model rejected its input.
    #[error("Model error: {0}")]
    Model(String),

    /// A template could not be turned into a structural pattern.
    #[error("Template error: {0}")]
    Template(String),

    /// Binary (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with HarkError.
pub type Result<T> = std::result::Result<T, HarkError>;

impl HarkError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        HarkError::Configuration(msg.into())
    }

    /// Create a new insufficient data error.
    pub fn insufficient_data<S: Into<String>>(msg: S) -> Self {
        HarkError::InsufficientData(msg.into())
    }

    /// Create a new untrainable error.
    pub fn untrainable<S: Into<String>>(msg: S) -> Self {
        HarkError::Untrainable(msg.into())
    }

    /// Wrap an error raised inside the training task of `label`.
    pub fn task_failure<S: Into<String>>(label: S, source: HarkError) -> Self {
        HarkError::TaskFailure {
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        HarkError::Model(msg.into())
    }

    /// Create a new template error.
    pub fn template<S: Into<String>>(msg: S) -> Self {
        HarkError::Template(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        HarkError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HarkError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        HarkError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
