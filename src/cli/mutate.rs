//! Mutate command implementation.

use super::{CliError, emit_population, load_components, load_mutation_config};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use symgraph::agraph::{AgraphMutation, load_population};

/// Execute the mutate command.
///
/// Every graph in the input population is replaced by one mutated child.
///
/// # Errors
///
/// Returns an error if a file cannot be read or a configuration is invalid.
pub(crate) fn execute(
    input: PathBuf,
    seed: u64,
    mutation: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let components = load_components(config.as_deref())?;
    let weights = load_mutation_config(mutation.as_deref())?;
    let mutation = AgraphMutation::new(&components, weights)?;
    let parents = load_population(&input)
        .map_err(|e| CliError::new(format!("Failed to load {}: {e}", input.display())))?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let children = parents
        .iter()
        .map(|parent| mutation.mutate(parent, &mut rng))
        .collect();
    emit_population(children, seed, output.as_deref())
}
