//! CLI command implementations for symgraph.

pub(crate) mod crossover;
pub(crate) mod generate;
pub(crate) mod mutate;
pub(crate) mod sample;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use symgraph::agraph::{
    BasicComponentGenerator, Checkpoint, CommandGraph, ComponentConfig, MutationConfig,
    save_checkpoint,
};

/// Output format for commands that report results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<symgraph::Error> for CliError {
    fn from(e: symgraph::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {e}"))
    }
}

/// Read a JSON configuration file, or fall back to the default.
fn read_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, CliError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let json = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&json)?)
}

/// Build the component generator from an optional JSON config file.
pub(crate) fn load_components(path: Option<&Path>) -> Result<BasicComponentGenerator, CliError> {
    let config: ComponentConfig = read_config(path)?;
    Ok(BasicComponentGenerator::new(&config)?)
}

/// Load mutation weights from an optional JSON config file.
pub(crate) fn load_mutation_config(path: Option<&Path>) -> Result<MutationConfig, CliError> {
    read_config(path)
}

/// Write a population to `output`, or print one formula per line.
pub(crate) fn emit_population(
    population: Vec<CommandGraph>,
    seed: u64,
    output: Option<&Path>,
) -> Result<(), CliError> {
    match output {
        Some(path) => {
            let count = population.len();
            save_checkpoint(&Checkpoint::new(population, seed), path)?;
            println!("Wrote {count} graphs to {}", path.display());
        }
        None => {
            for graph in &population {
                println!("{graph}");
            }
        }
    }
    Ok(())
}
