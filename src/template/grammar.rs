//! Template grammar expansion.
//!
//! `[x]` is shorthand for `(x|)`. Alternation groups `(a|b|c)` are expanded
//! innermost first until no group is left, so optional parts may contain
//! alternations and vice versa. Slot placeholders `{name}` pass through
//! untouched until [`expand_with_slots`] fills them.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPTIONAL: Regex = Regex::new(r"\[([^\[\]]+)\]").unwrap();
    static ref ALTERNATION: Regex = Regex::new(r"\([^()]+\)").unwrap();
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^{}]+)\}").unwrap();
    static ref SLOT_NAME: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

/// Whether `sample` is a template rather than a plain phrase.
pub fn is_template(sample: &str) -> bool {
    sample.contains('{') && sample.contains('}')
}

/// Slot names referenced by `template`, in order of appearance.
///
/// Only word characters form a slot name; the first name is the template's
/// family.
pub fn slot_names(template: &str) -> Vec<String> {
    SLOT_NAME
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Expand optional parts and alternations into every literal template.
///
/// Results are trimmed, deduplicated and sorted.
///
/// ```
/// use hark::template::expand_grammar;
///
/// let expanded = expand_grammar("[hello,] (call me|my name is) {name}");
/// assert_eq!(
///     expanded,
///     vec![
///         "call me {name}",
///         "hello, call me {name}",
///         "hello, my name is {name}",
///         "my name is {name}",
///     ]
/// );
/// ```
pub fn expand_grammar(template: &str) -> Vec<String> {
    let mut rewritten = template.to_string();
    loop {
        let next = OPTIONAL.replace_all(&rewritten, "(${1}|)").into_owned();
        if next == rewritten {
            break;
        }
        rewritten = next;
    }

    let mut current: BTreeSet<String> = BTreeSet::from([rewritten]);
    loop {
        let expanded: BTreeSet<String> = current
            .iter()
            .flat_map(|text| expand_alternatives(text))
            .map(|text| text.trim().to_string())
            .collect();
        if expanded == current {
            break;
        }
        current = expanded;
    }

    current.into_iter().collect()
}

/// Expand the grammar of `template`, then substitute every combination of the
/// candidate values in `slots`.
///
/// Placeholders without candidates stay literal. A name used twice in one
/// sentence gets the same value at both places.
///
/// ```
/// use std::collections::BTreeMap;
/// use hark::template::expand_with_slots;
///
/// let slots = BTreeMap::from([("color".to_string(), vec!["red".to_string(), "blue".to_string()])]);
/// let sentences = expand_with_slots("(set|change) light to {color}", &slots);
/// assert_eq!(sentences.len(), 4);
/// assert!(sentences.contains(&"set light to blue".to_string()));
/// ```
pub fn expand_with_slots(template: &str, slots: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut sentences = Vec::new();

    for sentence in expand_grammar(template) {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&sentence) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            if !names.contains(&name) {
                names.push(name);
            }
        }

        if names.is_empty() {
            sentences.push(sentence.clone());
            continue;
        }

        let candidates: Vec<Vec<String>> = names
            .iter()
            .map(|name| match slots.get(*name) {
                Some(values) => values.clone(),
                None => vec![format!("{{{name}}}")],
            })
            .collect();

        for combination in cartesian_product(&candidates) {
            let filled = PLACEHOLDER.replace_all(&sentence, |caps: &regex::Captures| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                names
                    .iter()
                    .position(|n| *n == name)
                    .map(|idx| combination[idx].to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            });
            sentences.push(filled.into_owned());
        }
    }

    sentences
}

/// Expand every alternation group of `text` once.
fn expand_alternatives(text: &str) -> Vec<String> {
    let mut parts: Vec<Vec<&str>> = Vec::new();
    let mut last = 0;

    for group in ALTERNATION.find_iter(text) {
        parts.push(vec![&text[last..group.start()]]);
        parts.push(text[group.start() + 1..group.end() - 1].split('|').collect());
        last = group.end();
    }
    parts.push(vec![&text[last..]]);

    cartesian_product(&parts)
        .into_iter()
        .map(|pieces| pieces.concat())
        .collect()
}

fn cartesian_product<T: AsRef<str>>(options: &[Vec<T>]) -> Vec<Vec<&str>> {
    let mut combinations: Vec<Vec<&str>> = vec![Vec::new()];
    for choices in options {
        combinations = combinations
            .iter()
            .flat_map(|prefix| {
                choices.iter().map(move |choice| {
                    let mut next = prefix.clone();
                    next.push(choice.as_ref());
                    next
                })
            })
            .collect();
    }
    combinations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str) -> Vec<String> {
        expand_grammar(template)
    }

    #[test]
    fn test_optional_and_alternation() {
        assert_eq!(
            expand("[hello,] (call me|my name is) {name}"),
            vec![
                "call me {name}",
                "hello, call me {name}",
                "hello, my name is {name}",
                "my name is {name}",
            ]
        );
    }

    #[test]
    fn test_mid_word_alternation() {
        assert_eq!(
            expand("sentence[s] can have (pre|suf)fixes mid word too"),
            vec![
                "sentence can have prefixes mid word too",
                "sentence can have suffixes mid word too",
                "sentences can have prefixes mid word too",
                "sentences can have suffixes mid word too",
            ]
        );
    }

    #[test]
    fn test_alternation_inside_optional() {
        assert_eq!(
            expand("[(this|that) is optional]"),
            vec!["", "that is optional", "this is optional"]
        );
        assert_eq!(
            expand("play {query} [in ({device_name}|{zone_name})]"),
            vec![
                "play {query}",
                "play {query} in {device_name}",
                "play {query} in {zone_name}",
            ]
        );
    }

    #[test]
    fn test_interior_spaces_are_kept() {
        assert_eq!(
            expand("sentences have [optional] words "),
            vec!["sentences have  words", "sentences have optional words"]
        );
    }

    #[test]
    fn test_independent_groups() {
        let expanded = expand("do( the | )thing(s|) (old|with) style");
        assert_eq!(expanded.len(), 8);
        assert!(expanded.contains(&"do the things with style".to_string()));
        assert!(expanded.contains(&"do thing old style".to_string()));
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(expand("  what time is it "), vec!["what time is it"]);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        for template in [
            "[hello,] (call me|my name is) {name}",
            "do( the | )thing(s|) (old|with) style and( no | )spaces",
            "tell me a [{joke_type}] joke",
        ] {
            for literal in expand(template) {
                assert_eq!(expand(&literal), vec![literal.clone()]);
            }
        }
    }

    #[test]
    fn test_expand_with_slots() {
        let slots = BTreeMap::from([
            (
                "brightness_level".to_string(),
                vec!["low".to_string(), "high".to_string()],
            ),
            (
                "color_name".to_string(),
                vec!["red".to_string(), "green".to_string(), "blue".to_string()],
            ),
        ]);

        let sentences = expand_with_slots(
            "change [the ]brightness to {brightness_level} and color to {color_name}",
            &slots,
        );
        assert_eq!(sentences.len(), 12);
        assert!(sentences.contains(&"change the brightness to low and color to red".to_string()));
        assert!(sentences.contains(&"change brightness to high and color to blue".to_string()));
    }

    #[test]
    fn test_missing_slots_stay_literal() {
        let slots = BTreeMap::from([("color".to_string(), vec!["red".to_string()])]);
        assert_eq!(
            expand_with_slots("change {thing} to {color}", &slots),
            vec!["change {thing} to red"]
        );
        assert_eq!(
            expand_with_slots("no slots here", &slots),
            vec!["no slots here"]
        );
    }

    #[test]
    fn test_repeated_slot_gets_one_value() {
        let slots = BTreeMap::from([("x".to_string(), vec!["a".to_string(), "b".to_string()])]);
        assert_eq!(expand_with_slots("{x} or {x}", &slots), vec!["a or a", "b or b"]);
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(
            slot_names("light from {color} to {color2}"),
            vec!["color", "color2"]
        );
        assert!(slot_names("{not a slot}").is_empty());
        assert!(is_template("call me {name}"));
        assert!(!is_template("call me"));
    }
}
