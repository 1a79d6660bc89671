//! Confidence fusion.
//!
//! `base → keyword boost → template override or penalty`. Every step is a
//! pure function of the previous confidence and the label's evidence.

use crate::engine::config::FusionConfig;
use crate::template::Slots;

/// Result of template matching for one label.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateOutcome {
    /// The label has no templates.
    NotTemplated,
    /// The label has templates but none matched.
    Unmatched,
    /// Slots of the best matching template.
    Matched(Slots),
}

/// The classifier probability, clamped to `[0, 1]`.
pub fn base_probability(probability: f64) -> f64 {
    probability.clamp(0.0, 1.0)
}

/// Multiply by `factor` when keyword slots were found, capped at 1.0.
pub fn keyword_boost(confidence: f64, keyword_slots: &Slots, factor: f64) -> f64 {
    if keyword_slots.is_empty() {
        confidence
    } else {
        (confidence * factor).min(1.0)
    }
}

/// Template slots replace keyword slots; an unmatched templated label is
/// penalized by `penalty`.
pub fn template_override_or_penalty(
    confidence: f64,
    keyword_slots: Slots,
    outcome: TemplateOutcome,
    penalty: f64,
) -> (f64, Slots) {
    match outcome {
        TemplateOutcome::NotTemplated => (confidence, keyword_slots),
        TemplateOutcome::Unmatched => (confidence * penalty, keyword_slots),
        TemplateOutcome::Matched(slots) => (confidence, slots),
    }
}

/// Fused confidence and slots for one label.
///
/// Labels without templates keep their base probability and keyword slots.
pub fn fuse(
    probability: f64,
    keyword_slots: Slots,
    outcome: TemplateOutcome,
    config: &FusionConfig,
) -> (f64, Slots) {
    let confidence = base_probability(probability);
    if outcome == TemplateOutcome::NotTemplated {
        return (confidence, keyword_slots);
    }

    let confidence = keyword_boost(confidence, &keyword_slots, config.keyword_boost);
    template_override_or_penalty(confidence, keyword_slots, outcome, config.template_penalty)
}
