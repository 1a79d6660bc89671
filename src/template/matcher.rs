//! Template families and ranked slot extraction.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::template::config::TemplateConfig;
use crate::template::grammar::slot_names;
use crate::template::pattern::TemplatePattern;
use crate::template::Slots;
use crate::util::fuzz::token_set_ratio;

/// One template that structurally matched an utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMatch {
    /// The literal template.
    pub template: String,
    /// Name of the template's first slot.
    pub family: String,
    /// Extracted slot values.
    pub slots: Slots,
    /// Token-set similarity between template and utterance.
    pub score: f64,
}

/// Literal templates grouped into families by their first slot name.
#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    config: TemplateConfig,
    families: BTreeMap<String, Vec<TemplatePattern>>,
}

impl TemplateMatcher {
    pub fn new(config: TemplateConfig) -> Self {
        Self {
            config,
            families: BTreeMap::new(),
        }
    }

    /// Register literal templates. Templates without a `{slot}` are skipped.
    ///
    /// Returns how many templates were added.
    pub fn add_templates<I, S>(&mut self, templates: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for template in templates {
            let template = template.as_ref();
            let Some(family) = slot_names(template).into_iter().next() else {
                debug!("Ignoring template without slots: '{template}'");
                continue;
            };

            let pattern = TemplatePattern::compile(template, self.config.case_sensitive)?;
            self.families.entry(family).or_default().push(pattern);
            added += 1;
        }
        Ok(added)
    }

    /// Family names, sorted.
    pub fn families(&self) -> Vec<&str> {
        self.families.keys().map(String::as_str).collect()
    }

    /// Every registered template, family by family.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.families
            .values()
            .flatten()
            .map(TemplatePattern::as_str)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.families.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// All templates matching `utterance`, best fuzzy score first.
    ///
    /// The score only orders structural matches; a template that does not
    /// match structurally is never returned. Equal scores keep family and
    /// registration order.
    pub fn matches(&self, utterance: &str) -> Vec<TemplateMatch> {
        let mut found: Vec<TemplateMatch> = self
            .families
            .iter()
            .flat_map(|(family, patterns)| {
                patterns.iter().filter_map(move |pattern| {
                    pattern.captures(utterance).map(|slots| TemplateMatch {
                        template: pattern.as_str().to_string(),
                        family: family.clone(),
                        slots,
                        score: token_set_ratio(pattern.as_str(), utterance),
                    })
                })
            })
            .collect();

        found.sort_by(|a, b| b.score.total_cmp(&a.score));
        found
    }

    /// Slot maps of every match, best first.
    pub fn match_slots(&self, utterance: &str) -> Vec<Slots> {
        self.matches(utterance).into_iter().map(|m| m.slots).collect()
    }

    /// Slots of the best match, if any template matches.
    pub fn best_slots(&self, utterance: &str) -> Option<Slots> {
        self.matches(utterance).into_iter().next().map(|m| m.slots)
    }
}
