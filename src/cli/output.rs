//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{HarkArgs, OutputFormat};
use crate::engine::{IntentMatch, UtteranceMatch};
use crate::error::Result;

/// Ranked intents for one utterance.
#[derive(Debug, Serialize, Deserialize)]
pub struct UtterancePrediction {
    pub utterance: String,
    pub intents: Vec<IntentMatch>,
}

/// Result of the `predict` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResults {
    pub predictions: Vec<UtterancePrediction>,
    pub duration_ms: u64,
}

/// Result of the `predict --best` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct BestResult {
    pub best: Option<UtteranceMatch>,
    pub duration_ms: u64,
}

/// Result of the `expand` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub template: String,
    pub expansions: Vec<String>,
}

/// Result of the `entities` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntityCompilationResult {
    pub path: String,
    pub strategy: String,
    pub entities: BTreeMap<String, usize>,
    pub size_bytes: u64,
}

/// Result of the `extract` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub utterance: String,
    pub entities: BTreeMap<String, String>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self);
}

impl HumanOutput for PredictionResults {
    fn print_human(&self) {
        for prediction in &self.predictions {
            println!("\"{}\"", prediction.utterance);
            println!("─────────────");
            if prediction.intents.is_empty() {
                println!("  (no intents)");
            }
            for (i, intent) in prediction.intents.iter().enumerate() {
                println!("  {}. {} ({:.3}){}", i + 1, intent.name, intent.confidence, format_slots(&intent.slots));
            }
            println!();
        }
        println!("Prediction time: {}ms", self.duration_ms);
    }
}

impl HumanOutput for BestResult {
    fn print_human(&self) {
        match &self.best {
            Some(best) => println!(
                "\"{}\" → {} ({:.3}){}",
                best.utterance,
                best.intent.name,
                best.intent.confidence,
                format_slots(&best.intent.slots)
            ),
            None => println!("No intent matched"),
        }
        println!("Prediction time: {}ms", self.duration_ms);
    }
}

impl HumanOutput for ExpansionResult {
    fn print_human(&self) {
        for expansion in &self.expansions {
            println!("{expansion}");
        }
    }
}

impl HumanOutput for EntityCompilationResult {
    fn print_human(&self) {
        println!("Matcher: {} ({})", self.path, self.strategy);
        println!("Size: {}", format_bytes(self.size_bytes));
        for (name, phrases) in &self.entities {
            println!("  {name}: {phrases} phrase(s)");
        }
    }
}

impl HumanOutput for ExtractionResult {
    fn print_human(&self) {
        if self.entities.is_empty() {
            println!("No entities found");
        }
        for (name, value) in &self.entities {
            println!("{name}: {value}");
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &HarkArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &HarkArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

fn format_slots(slots: &BTreeMap<String, String>) -> String {
    if slots.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = slots.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!(" [{}]", pairs.join(", "))
}

/// Format bytes in human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
