//! Keyword/entity matching.
//!
//! An [`EntityMatcher`] keeps named sets of phrases ("entities"), finds them
//! in utterances, extracts one value per entity and encodes utterances as
//! binary feature vectors over the sorted entity names.
//!
//! # Example
//!
//! ```
//! use hark::entity::EntityMatcher;
//!
//! let mut matcher = EntityMatcher::naive();
//! matcher.register("fruit", ["apple", "banana", "cherry"]);
//! matcher.register("color", ["red", "green", "blue"]);
//!
//! let slots = matcher.extract("I have a red apple");
//! assert_eq!(slots["fruit"], "apple");
//! assert_eq!(slots["color"], "red");
//! assert_eq!(matcher.one_hot_encode("green"), vec![1.0, 0.0]);
//! ```

pub mod config;
mod index;
pub mod matcher;

pub use config::{MatchStrategy, MatcherConfig};
pub use matcher::{EntityMatch, EntityMatcher, FeatureVector};
