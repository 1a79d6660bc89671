//! # Hark
//!
//! Incremental intent classification and slot filling for short voice or
//! text commands.
//!
//! ## Features
//!
//! - One adaptive binary classifier per intent, retrained as examples arrive
//! - Negative mining from every other intent's positives
//! - Keyword (entity) matching with naive regex or Aho-Corasick strategies
//! - Sample grammar: `[optional]`, `(a|b)` alternatives and `{slot}` templates
//! - Confidence fusion of classifier, keyword and template evidence
//!
//! ## Example
//!
//! ```
//! use hark::prelude::*;
//!
//! let samples = expand_grammar("[please] turn (on|off) the light");
//! assert_eq!(samples.len(), 4);
//! assert!(samples.contains(&"please turn off the light".to_string()));
//! ```
//!
//! See [`engine`] for registering intents and ranking utterances.

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod engine;
pub mod entity;
pub mod error;
pub mod template;
pub mod util;

pub mod prelude {
    pub use crate::classifier::{ClassifierConfig, LabelRegistry, ModelConfig, TrainingLabel};
    pub use crate::engine::{
        ConfidenceTier, EngineConfig, EntitySamples, IntentEngine, IntentFilter, IntentMatch,
        UtteranceMatch,
    };
    pub use crate::entity::{EntityMatcher, MatchStrategy, MatcherConfig};
    pub use crate::error::{HarkError, Result};
    pub use crate::template::{TemplateMatcher, expand_grammar, expand_with_slots};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
