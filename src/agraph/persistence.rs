//! Persistence for populations of command graphs.
//!
//! Checkpoints are stored as pretty-printed JSON so populations can be
//! inspected and edited by hand. Every graph is re-validated on load.

use crate::agraph::graph::CommandGraph;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Current checkpoint format version.
pub const FORMAT_VERSION: u32 = 1;

/// A saved population and the seed needed to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version of the file.
    pub format_version: u32,
    /// Population of graphs.
    pub population: Vec<CommandGraph>,
    /// Seed of the random source that produced the population.
    pub rng_seed: u64,
}

impl Checkpoint {
    /// Create a checkpoint in the current format.
    #[must_use]
    pub fn new(population: Vec<CommandGraph>, rng_seed: u64) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            population,
            rng_seed,
        }
    }
}

fn invalid_data(message: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Save a population with no recorded seed.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_population(population: &[CommandGraph], path: &Path) -> io::Result<()> {
    save_checkpoint(&Checkpoint::new(population.to_vec(), 0), path)
}

/// Save a full checkpoint.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path) -> io::Result<()> {
    let json = serde_json::to_string_pretty(checkpoint).map_err(invalid_data)?;
    fs::write(path, json)?;
    log::debug!(
        "saved {} graphs to {}",
        checkpoint.population.len(),
        path.display()
    );
    Ok(())
}

/// Load the population from a checkpoint file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds an invalid checkpoint.
pub fn load_population(path: &Path) -> io::Result<Vec<CommandGraph>> {
    Ok(load_checkpoint(path)?.population)
}

/// Load a full checkpoint.
///
/// # Errors
///
/// Returns an error of kind [`io::ErrorKind::InvalidData`] if the JSON is
/// malformed, the format version is unsupported, or any graph has a forward
/// reference or an unresolvable constant.
pub fn load_checkpoint(path: &Path) -> io::Result<Checkpoint> {
    let json = fs::read_to_string(path)?;
    let checkpoint: Checkpoint = serde_json::from_str(&json).map_err(invalid_data)?;

    if checkpoint.format_version != FORMAT_VERSION {
        return Err(invalid_data(format!(
            "unsupported checkpoint version: {}",
            checkpoint.format_version
        )));
    }
    for (index, graph) in checkpoint.population.iter().enumerate() {
        graph
            .validate()
            .map_err(|e| invalid_data(format!("graph {index}: {e}")))?;
    }
    Ok(checkpoint)
}

/// Path of the checkpoint for a given generation.
#[must_use]
pub fn checkpoint_path(output_dir: &Path, generation: u32) -> PathBuf {
    output_dir.join(format!("gen_{generation:05}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agraph::command::{BinaryOperator, Command, ConstantRef};
    use tempfile::tempdir;

    fn population() -> Vec<CommandGraph> {
        let mut first = CommandGraph::new(
            vec![
                Command::Load(0),
                Command::Constant(ConstantRef::Concrete(0)),
                Command::Binary(BinaryOperator::Multiply, 0, 1),
            ],
            vec![2.5],
        )
        .unwrap();
        first.set_genetic_age(3);
        let second = CommandGraph::new(
            vec![Command::Load(1), Command::PENDING_CONSTANT],
            Vec::new(),
        )
        .unwrap();
        vec![first, second]
    }

    #[test]
    fn test_checkpoint_survives_disk() {
        let dir = tempdir().unwrap();
        let path = checkpoint_path(dir.path(), 7);
        let checkpoint = Checkpoint::new(population(), 42);

        save_checkpoint(&checkpoint, &path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.population[0].genetic_age(), 3);
        assert_eq!(loaded.population[1].find_pending_constants(), vec![1]);
    }

    #[test]
    fn test_save_population_records_no_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("population.json");

        save_population(&population(), &path).unwrap();

        assert_eq!(load_population(&path).unwrap(), population());
        assert_eq!(load_checkpoint(&path).unwrap().rng_seed, 0);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.json");
        let mut checkpoint = Checkpoint::new(population(), 1);
        checkpoint.format_version = FORMAT_VERSION + 1;
        save_checkpoint(&checkpoint, &path).unwrap();

        let err = load_checkpoint(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_forward_reference() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cyclic.json");
        let json = r#"{
            "format_version": 1,
            "rng_seed": 0,
            "population": [{
                "commands": [{"Binary": ["Add", 1, 0]}, {"Load": 0}],
                "constants": []
            }]
        }"#;
        fs::write(&path, json).unwrap();

        let err = load_population(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("graph 0"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(
            load_checkpoint(&path).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }
}
