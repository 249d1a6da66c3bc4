//! Crossover command implementation.

use super::{CliError, emit_population, load_components};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use symgraph::agraph::{AgraphCrossover, load_population};

/// Execute the crossover command.
///
/// The i-th graph of `first` is crossed with the i-th graph of `second`;
/// surplus graphs in the longer population are ignored.
///
/// # Errors
///
/// Returns an error if a file cannot be read or a pair of parents cannot be
/// crossed.
pub(crate) fn execute(
    first: PathBuf,
    second: PathBuf,
    seed: u64,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let components = load_components(config.as_deref())?;
    let crossover = AgraphCrossover::new(&components);
    let load = |path: &PathBuf| {
        load_population(path)
            .map_err(|e| CliError::new(format!("Failed to load {}: {e}", path.display())))
    };
    let (first, second) = (load(&first)?, load(&second)?);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut children = Vec::with_capacity(2 * first.len().min(second.len()));
    for (parent_1, parent_2) in first.iter().zip(&second) {
        let (child_1, child_2) = crossover.crossover(parent_1, parent_2, &mut rng)?;
        children.push(child_1);
        children.push(child_2);
    }
    emit_population(children, seed, output.as_deref())
}
