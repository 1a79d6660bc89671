//! Command implementations for the Hark CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use log::info;
use serde::Deserialize;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::engine::{EngineConfig, EntitySamples, IntentEngine};
use crate::entity::{EntityMatcher, MatchStrategy, MatcherConfig};
use crate::error::{HarkError, Result};
use crate::template::{expand_grammar, expand_with_slots};

/// Samples of one intent in an intents file.
///
/// Either a plain list of samples or an object that also carries
/// intent-scoped entity values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntentDefinition {
    Samples(Vec<String>),
    Extended {
        samples: Vec<String>,
        #[serde(default)]
        entities: EntitySamples,
    },
}

impl IntentDefinition {
    fn samples(&self) -> &[String] {
        match self {
            IntentDefinition::Samples(samples) => samples,
            IntentDefinition::Extended { samples, .. } => samples,
        }
    }

    fn entities(&self) -> Option<&EntitySamples> {
        match self {
            IntentDefinition::Samples(_) => None,
            IntentDefinition::Extended { entities, .. } => Some(entities),
        }
    }
}

/// Execute a CLI command.
pub fn execute_command(args: HarkArgs) -> Result<()> {
    match &args.command {
        Command::Predict(predict_args) => predict(predict_args.clone(), &args),
        Command::Expand(expand_args) => expand(expand_args.clone(), &args),
        Command::Entities(entities_args) => compile_entities(entities_args.clone(), &args),
        Command::Extract(extract_args) => extract(extract_args.clone(), &args),
    }
}

/// Build an engine from intent and entity files.
pub fn load_engine(
    intents_file: &Path,
    entities_file: Option<&Path>,
    config: EngineConfig,
) -> Result<IntentEngine> {
    let intents: BTreeMap<String, IntentDefinition> =
        serde_json::from_str(&fs::read_to_string(intents_file)?)?;
    if intents.is_empty() {
        return Err(HarkError::invalid_argument(format!(
            "No intents defined in {}",
            intents_file.display()
        )));
    }

    let mut engine = IntentEngine::new(config)?;
    for (name, definition) in &intents {
        engine.register_intent(name, definition.samples(), definition.entities())?;
    }

    if let Some(entities_file) = entities_file {
        let entities: EntitySamples = serde_json::from_str(&fs::read_to_string(entities_file)?)?;
        for (name, samples) in &entities {
            engine.register_entity(name, samples, None)?;
        }
    }

    info!("Loaded {} intent(s) from {}", intents.len(), intents_file.display());
    Ok(engine)
}

/// Rank intents for the given utterances.
fn predict(args: PredictArgs, cli_args: &HarkArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }

    let engine = load_engine(&args.intents, args.entities.as_deref(), config)?;

    let start_time = Instant::now();
    engine.train()?;

    if args.best {
        let best = engine.calc_best(&args.utterances)?;
        return output_result(
            "Best intent",
            &BestResult {
                best,
                duration_ms: start_time.elapsed().as_millis() as u64,
            },
            cli_args,
        );
    }

    let top_n = engine.config().top_n;
    let mut predictions = Vec::with_capacity(args.utterances.len());
    for utterance in &args.utterances {
        predictions.push(UtterancePrediction {
            utterance: utterance.clone(),
            intents: engine.predict(utterance, top_n)?,
        });
    }

    output_result(
        "Predictions",
        &PredictionResults {
            predictions,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Expand a sample's grammar and fill its slots.
fn expand(args: ExpandArgs, cli_args: &HarkArgs) -> Result<()> {
    let slots: BTreeMap<String, Vec<String>> = args.slots.iter().cloned().collect();

    let mut expansions: Vec<String> = expand_grammar(&args.template)
        .iter()
        .flat_map(|sample| {
            if slots.is_empty() {
                vec![sample.clone()]
            } else {
                expand_with_slots(sample, &slots)
            }
        })
        .collect();
    expansions.sort();
    expansions.dedup();

    output_result(
        "Expansions",
        &ExpansionResult {
            template: args.template,
            expansions,
        },
        cli_args,
    )
}

/// Compile an entity CSV into a matcher blob.
fn compile_entities(args: EntitiesArgs, cli_args: &HarkArgs) -> Result<()> {
    let strategy = if args.indexed {
        MatchStrategy::Indexed
    } else {
        MatchStrategy::Naive
    };
    let mut matcher = EntityMatcher::new(MatcherConfig {
        strategy,
        ..Default::default()
    })?;

    let loaded = matcher.load_csv(&args.csv)?;
    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    matcher.save(&args.output)?;

    output_result(
        "Entity matcher compiled",
        &EntityCompilationResult {
            path: args.output.to_string_lossy().to_string(),
            strategy: format!("{strategy:?}").to_lowercase(),
            entities: loaded.iter().map(|(k, v)| (k.clone(), v.len())).collect(),
            size_bytes: fs::metadata(&args.output)?.len(),
        },
        cli_args,
    )
}

/// Extract entities with a saved matcher.
fn extract(args: ExtractArgs, cli_args: &HarkArgs) -> Result<()> {
    let mut matcher = EntityMatcher::default();
    matcher.load(&args.matcher)?;

    output_result(
        "Entities",
        &ExtractionResult {
            entities: matcher.extract(&args.utterance),
            utterance: args.utterance,
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_intent_definition_forms() {
        let intents: BTreeMap<String, IntentDefinition> = serde_json::from_str(
            r#"{
                "hello": ["hello world"],
                "lights": {"samples": ["turn on the {room} light"], "entities": {"room": ["kitchen"]}}
            }"#,
        )
        .unwrap();

        assert_eq!(intents["hello"].samples(), ["hello world"]);
        assert!(intents["hello"].entities().is_none());
        assert_eq!(intents["lights"].entities().unwrap()["room"], vec!["kitchen"]);
    }

    #[test]
    fn test_load_engine() {
        let intents = json_file(
            r#"{
                "hello": ["hello world", "hey there", "hello"],
                "joke": ["tell me a joke", "say a joke", "make me laugh"],
                "weather": ["how is the weather", "what is the weather like"]
            }"#,
        );
        let entities = json_file(r#"{"city": ["lisbon", "porto"]}"#);

        let engine = load_engine(intents.path(), Some(entities.path()), EngineConfig::default())
            .unwrap();
        assert_eq!(engine.intents(), vec!["hello", "joke", "weather"]);
    }

    #[test]
    fn test_load_engine_rejects_empty() {
        let intents = json_file("{}");
        let result = load_engine(intents.path(), None, EngineConfig::default());
        assert!(matches!(result, Err(HarkError::Other(_))));
    }
}
