//! Entity matchers saved to disk and loaded back.

use std::io::Write;

use hark::entity::{EntityMatcher, MatchStrategy, MatcherConfig};
use hark::error::Result;
use tempfile::{NamedTempFile, TempDir};

fn fruit_matcher(config: MatcherConfig) -> Result<EntityMatcher> {
    let mut matcher = EntityMatcher::new(config)?;
    matcher.register("fruit", ["apple", "banana", "green apple"]);
    matcher.register("color", ["red", "green", "yellow"]);
    Ok(matcher)
}

#[test]
fn test_save_and_load_naive() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("fruit.hkem");

    let matcher = fruit_matcher(MatcherConfig::default())?;
    matcher.save(&path)?;

    let mut restored = EntityMatcher::default();
    restored.load(&path)?;
    assert_eq!(restored.strategy(), MatchStrategy::Naive);
    assert_eq!(restored.labels(), matcher.labels());

    let utterance = "I want a green apple and a banana";
    assert_eq!(restored.extract(utterance), matcher.extract(utterance));
    assert_eq!(restored.extract(utterance)["fruit"], "green apple");
    assert_eq!(
        restored.one_hot_encode(utterance),
        matcher.one_hot_encode(utterance)
    );

    Ok(())
}

#[cfg(feature = "automaton")]
#[test]
fn test_save_and_load_indexed() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("fruit.hkem");

    let config = MatcherConfig::indexed().with_ignore_list(["bob"]);
    let matcher = fruit_matcher(config)?;
    matcher.save(&path)?;

    let mut restored = EntityMatcher::default();
    restored.load(&path)?;
    assert_eq!(restored.strategy(), MatchStrategy::Indexed);
    assert_eq!(restored.ignore_list(), ["bob"]);
    assert_eq!(restored.extract("Yellow Banana!")["fruit"], "banana");
    assert_eq!(restored.extract("Yellow Banana!")["color"], "yellow");

    Ok(())
}

#[test]
fn test_load_rejects_foreign_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"definitely not a matcher")?;

    let mut matcher = EntityMatcher::default();
    assert!(matcher.load(file.path()).is_err());
    assert!(matcher.is_empty());

    Ok(())
}

#[test]
fn test_csv_then_blob() -> Result<()> {
    let mut csv = NamedTempFile::new()?;
    writeln!(csv, "entity,phrase")?;
    writeln!(csv, "city,lisbon")?;
    writeln!(csv, "city,porto")?;
    writeln!(csv, "greeting,good morning, sir")?;

    let mut matcher = EntityMatcher::default();
    let loaded = matcher.load_csv(csv.path())?;
    assert_eq!(loaded["city"], vec!["lisbon", "porto"]);
    assert_eq!(loaded["greeting"], vec!["good morning, sir"]);

    let bytes = matcher.to_bytes()?;
    let restored = EntityMatcher::from_bytes(&bytes)?;
    assert_eq!(restored.extract("fly to porto")["city"], "porto");

    Ok(())
}
