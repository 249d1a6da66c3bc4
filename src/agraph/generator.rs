//! Random initial command graphs.

use crate::agraph::component::ComponentGenerator;
use crate::agraph::graph::CommandGraph;
use crate::error::{Error, Result};
use rand::Rng;

/// Builds random graphs of a fixed row count.
#[derive(Debug, Clone)]
pub struct GraphGenerator<G> {
    command_count: usize,
    components: G,
}

impl<G: ComponentGenerator> GraphGenerator<G> {
    /// Create a generator producing graphs with `command_count` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `command_count` is zero.
    pub fn new(command_count: usize, components: G) -> Result<Self> {
        if command_count == 0 {
            return Err(Error::validation("command_count must be at least 1"));
        }
        Ok(Self {
            command_count,
            components,
        })
    }

    /// Number of rows in generated graphs.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.command_count
    }

    /// Generate a random graph with age 0 and no fitness.
    ///
    /// Constants stay pending under automatic constant optimization and are
    /// drawn immediately otherwise.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> CommandGraph {
        let commands = (0..self.command_count)
            .map(|row| self.components.random_command(row, rng))
            .collect();
        let mut graph = CommandGraph::from_parts(commands, Vec::new(), 0);
        if !self.components.automatic_constant_optimization() {
            graph.fill_pending_constants(|| self.components.random_numerical_constant(rng));
        }
        graph
    }
}
