//! Generate command implementation.

use super::{CliError, emit_population, load_components};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use symgraph::agraph::GraphGenerator;

/// Execute the generate command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the output cannot be
/// written.
pub(crate) fn execute(
    rows: usize,
    count: usize,
    seed: u64,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let components = load_components(config.as_deref())?;
    let generator = GraphGenerator::new(rows, &components)?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let population = (0..count).map(|_| generator.generate(&mut rng)).collect();
    emit_population(population, seed, output.as_deref())
}
