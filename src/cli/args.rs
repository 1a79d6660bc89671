//! Command line argument parsing for the Hark CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hark - incremental intent classification for short commands
#[derive(Parser, Debug, Clone)]
#[command(name = "hark")]
#[command(about = "Incremental intent classification and slot filling for short commands")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HarkArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl HarkArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rank intents for one or more utterances
    Predict(PredictArgs),

    /// Expand a sample's `[optional]` and `(a|b)` grammar, then fill its slots
    Expand(ExpandArgs),

    /// Compile an entity CSV into a keyword matcher blob
    Entities(EntitiesArgs),

    /// Extract entities from an utterance with a saved keyword matcher
    Extract(ExtractArgs),
}

/// Arguments for ranking intents
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// JSON file mapping intent names to samples
    #[arg(short, long)]
    pub intents: PathBuf,

    /// JSON file mapping entity names to sample values, shared by all intents
    #[arg(short, long)]
    pub entities: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of intents to report per utterance (overrides the configuration)
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// Only report the single best intent across all utterances
    #[arg(long)]
    pub best: bool,

    /// Utterances to classify
    #[arg(required = true)]
    pub utterances: Vec<String>,
}

/// Arguments for expanding a sample
#[derive(Parser, Debug, Clone)]
pub struct ExpandArgs {
    /// Sample to expand, e.g. "[please] change (the|a) light to {color}"
    pub template: String,

    /// Slot values as name=value1,value2 (repeatable)
    #[arg(short, long = "slot", value_parser = parse_slot)]
    pub slots: Vec<(String, Vec<String>)>,
}

/// Arguments for compiling entities
#[derive(Parser, Debug, Clone)]
pub struct EntitiesArgs {
    /// CSV file with an `entity,phrase` header
    #[arg(long)]
    pub csv: PathBuf,

    /// Where to write the matcher blob
    #[arg(short, long)]
    pub output: PathBuf,

    /// Use the automaton-backed strategy
    #[arg(long)]
    pub indexed: bool,
}

/// Arguments for extracting entities
#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// Matcher blob written by `hark entities`
    #[arg(short, long)]
    pub matcher: PathBuf,

    /// Utterance to scan
    pub utterance: String,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

/// Parse a `name=value1,value2` slot argument.
fn parse_slot(s: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value1,value2, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing slot name in '{s}'"));
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    Ok((name.to_string(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let args = HarkArgs::parse_from([
            "hark",
            "-vv",
            "predict",
            "--intents",
            "intents.json",
            "-n",
            "2",
            "tell me a joke",
        ]);
        assert_eq!(args.verbosity(), 2);
        match args.command {
            Command::Predict(predict) => {
                assert_eq!(predict.intents, PathBuf::from("intents.json"));
                assert_eq!(predict.top_n, Some(2));
                assert_eq!(predict.utterances, vec!["tell me a joke"]);
                assert!(!predict.best);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = HarkArgs::parse_from(["hark", "-q", "-vvv", "expand", "hi"]);
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_parse_slots() {
        let args = HarkArgs::parse_from([
            "hark",
            "--format",
            "json",
            "expand",
            "change light to {color}",
            "--slot",
            "color=red, green",
        ]);
        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::Expand(expand) => {
                assert_eq!(
                    expand.slots,
                    vec![("color".to_string(), vec!["red".to_string(), "green".to_string()])]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_slot_rejects_missing_name() {
        assert!(parse_slot("red,green").is_err());
        assert!(parse_slot("=red").is_err());
    }
}
