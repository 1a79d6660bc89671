//! Result types of the intent engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::template::Slots;

/// One ranked intent for an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    /// Intent (label) name.
    pub name: String,
    /// Extracted slot values; may be empty.
    pub slots: Slots,
    /// Fused confidence in `[0, 1]`.
    pub confidence: f64,
}

impl IntentMatch {
    /// The part of the intent name before the first `:`.
    pub fn skill_id(&self) -> &str {
        skill_id(&self.name)
    }
}

/// The best intent across several candidate utterances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceMatch {
    /// The utterance that produced the match.
    pub utterance: String,
    pub intent: IntentMatch,
}

/// Confidence levels a host can ask for, from strictest to loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Intents and skills a caller does not want to be matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentFilter {
    /// Full intent names to skip.
    pub blocked_intents: BTreeSet<String>,
    /// Skill ids (intent name prefix before `:`) to skip.
    pub blocked_skills: BTreeSet<String>,
}

impl IntentFilter {
    pub fn allows(&self, intent: &IntentMatch) -> bool {
        !self.blocked_intents.contains(&intent.name)
            && !self.blocked_skills.contains(intent.skill_id())
    }
}

/// Skill id of an intent or entity name such as `weather.skill:forecast`.
pub fn skill_id(name: &str) -> &str {
    name.split(':').next().unwrap_or(name)
}
