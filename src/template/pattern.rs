//! Structural patterns compiled from literal templates.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::error::{HarkError, Result};
use crate::template::Slots;

lazy_static! {
    static ref PLACEHOLDER_OR_WILDCARD: Regex = Regex::new(r"\{(\w+)\}|\*").unwrap();
}

/// A literal template compiled into an anchored regex.
///
/// Each `{slot}` becomes a non-empty lazy capture and `*` matches any text
/// without capturing; everything else must match literally. When a slot name
/// appears more than once, the first occurrence provides the value.
#[derive(Debug, Clone)]
pub struct TemplatePattern {
    template: String,
    regex: Regex,
    /// Slot name of every capture group, in group order.
    slots: Vec<String>,
}

impl TemplatePattern {
    /// Compile `template`.
    pub fn compile(template: &str, case_sensitive: bool) -> Result<Self> {
        let mut pattern = String::from("^");
        let mut slots = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER_OR_WILDCARD.captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            match caps.get(1) {
                Some(name) => {
                    pattern.push_str("(.+?)");
                    slots.push(name.as_str().to_string());
                }
                None => pattern.push_str(".*?"),
            }
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| HarkError::template(format!("Cannot compile '{template}': {e}")))?;

        Ok(Self {
            template: template.to_string(),
            regex,
            slots,
        })
    }

    /// The template this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Slot names in order of appearance, repeats included.
    pub fn slot_names(&self) -> &[String] {
        &self.slots
    }

    /// Slot values when the whole `utterance` matches, `None` otherwise.
    pub fn captures(&self, utterance: &str) -> Option<Slots> {
        let caps = self.regex.captures(utterance)?;

        let mut slots = Slots::new();
        for (idx, name) in self.slots.iter().enumerate() {
            if let Some(value) = caps.get(idx + 1) {
                slots
                    .entry(name.clone())
                    .or_insert_with(|| value.as_str().to_string());
            }
        }
        Some(slots)
    }
}
