//! Configuration for the intent engine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierConfig;
use crate::engine::types::ConfidenceTier;
use crate::entity::MatcherConfig;
use crate::error::Result;
use crate::template::TemplateConfig;

/// How classifier confidence is combined with keyword and template evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Multiplier for a templated label whose keywords matched (capped at 1.0).
    pub keyword_boost: f64,
    /// Multiplier for a templated label whose templates did not match.
    pub template_penalty: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            keyword_boost: 1.1,
            template_penalty: 0.75,
        }
    }
}

/// Minimum confidence (exclusive) of each [`ConfidenceTier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 0.95,
            medium: 0.8,
            low: 0.5,
        }
    }
}

impl TierThresholds {
    pub fn threshold(&self, tier: ConfidenceTier) -> f64 {
        match tier {
            ConfidenceTier::High => self.high,
            ConfidenceTier::Medium => self.medium,
            ConfidenceTier::Low => self.low,
        }
    }
}

/// Intent engine configuration.
///
/// Every section falls back to its defaults, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-label classifiers and the registry.
    pub classifier: ClassifierConfig,
    /// Keyword matchers created for each intent.
    pub matcher: MatcherConfig,
    /// Template matchers created for each intent.
    pub template: TemplateConfig,
    pub fusion: FusionConfig,
    pub tiers: TierThresholds,
    /// Utterances with this many words or more are not matched.
    pub max_words: usize,
    /// Default number of predictions returned.
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            matcher: MatcherConfig::default(),
            template: TemplateConfig::default(),
            fusion: FusionConfig::default(),
            tiers: TierThresholds::default(),
            max_words: 50,
            top_n: 3,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
