//! Slot templates.
//!
//! Templates are sentences with `{slot}` placeholders, optionally written in a
//! small grammar: `[optional words]` and `(alternative|choices)`.
//! [`grammar`] expands that grammar into literal templates and fills slots
//! from candidate values; [`TemplateMatcher`] extracts slot values from an
//! utterance by structural matching and ranks the hits by fuzzy similarity.
//!
//! # Example
//!
//! ```
//! use hark::template::TemplateMatcher;
//!
//! let mut matcher = TemplateMatcher::default();
//! matcher.add_templates(["my name is {name}", "call me {name}"]).unwrap();
//!
//! let slots = matcher.best_slots("call me Casimiro").unwrap();
//! assert_eq!(slots["name"], "Casimiro");
//! assert!(matcher.best_slots("what time is it").is_none());
//! ```

pub mod config;
pub mod grammar;
pub mod matcher;
pub mod pattern;

use std::collections::BTreeMap;

pub use config::TemplateConfig;
pub use grammar::{expand_grammar, expand_with_slots, is_template, slot_names};
pub use matcher::{TemplateMatch, TemplateMatcher};
pub use pattern::TemplatePattern;

/// Slot name to extracted value.
pub type Slots = BTreeMap<String, String>;
