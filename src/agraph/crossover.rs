//! Single-point crossover between command graphs.
//!
//! Two parents of equal length exchange every row from a cut point onward.
//! Operand references stay valid without adjustment because both halves keep
//! their row positions; constant references from the second parent are
//! shifted so they resolve into the combined constants store.

use crate::agraph::command::{Command, ConstantRef};
use crate::agraph::component::ComponentGenerator;
use crate::agraph::graph::CommandGraph;
use crate::error::{Error, Result};
use rand::Rng;

/// Crossover operator for command graphs.
#[derive(Debug, Clone)]
pub struct AgraphCrossover<G> {
    generator: G,
    manual_constants: bool,
}

impl<G: ComponentGenerator> AgraphCrossover<G> {
    /// Create a crossover operator drawing manual constants from `generator`.
    pub fn new(generator: G) -> Self {
        let manual_constants = !generator.automatic_constant_optimization();
        Self {
            generator,
            manual_constants,
        }
    }

    /// Cross two parents at a random interior cut point.
    ///
    /// The cut point is drawn uniformly from `1..N`, so each child keeps at
    /// least one row of each parent. Both children get the older parent's
    /// genetic age and an empty fitness cache. Parents are not modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the parents differ in length or have
    /// fewer than two rows.
    pub fn crossover<R: Rng>(
        &self,
        parent_1: &CommandGraph,
        parent_2: &CommandGraph,
        rng: &mut R,
    ) -> Result<(CommandGraph, CommandGraph)> {
        let len = check_parents(parent_1, parent_2)?;
        let cut = rng.gen_range(1..len);
        self.crossover_at(parent_1, parent_2, cut, rng)
    }

    /// Cross two parents at a given cut point.
    ///
    /// Child 1 takes rows `..cut` from `parent_1` and rows `cut..` from
    /// `parent_2`; child 2 is the complement.
    ///
    /// Each child starts from the concatenated parent stores with `parent_2`'s
    /// indices shifted past `parent_1`'s, and is then compacted: entries no
    /// row references are dropped and indices are renumbered in row order.
    /// Every constant row keeps the value it had in its source parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the parents differ in length, have
    /// fewer than two rows, or `cut` is not in `1..N`.
    pub fn crossover_at<R: Rng>(
        &self,
        parent_1: &CommandGraph,
        parent_2: &CommandGraph,
        cut: usize,
        rng: &mut R,
    ) -> Result<(CommandGraph, CommandGraph)> {
        let len = check_parents(parent_1, parent_2)?;
        if cut == 0 || cut >= len {
            return Err(Error::invalid_input(format!(
                "cut point {cut} is not interior to graphs of {len} rows"
            )));
        }
        log::trace!("crossover at row {cut} of {len}");

        let offset = parent_1.constants().len();
        let shifted: Vec<Command> = parent_2
            .commands()
            .iter()
            .map(|command| shift_constant(*command, offset))
            .collect();
        let constants: Vec<f64> = parent_1
            .constants()
            .iter()
            .chain(parent_2.constants())
            .copied()
            .collect();
        let age = parent_1.genetic_age().max(parent_2.genetic_age());

        let first = splice(&parent_1.commands()[..cut], &shifted[cut..]);
        let second = splice(&shifted[..cut], &parent_1.commands()[cut..]);

        let child_1 = self.finish(CommandGraph::from_parts(first, constants.clone(), age), rng);
        let child_2 = self.finish(CommandGraph::from_parts(second, constants, age), rng);
        Ok((child_1, child_2))
    }

    fn finish<R: Rng>(&self, mut child: CommandGraph, rng: &mut R) -> CommandGraph {
        child.compact_constants();
        if self.manual_constants {
            child.fill_pending_constants(|| self.generator.random_numerical_constant(rng));
            child.compact_constants();
        }
        child
    }
}

fn check_parents(parent_1: &CommandGraph, parent_2: &CommandGraph) -> Result<usize> {
    let len = parent_1.len();
    if len != parent_2.len() {
        return Err(Error::invalid_input(format!(
            "crossover parents differ in length: {len} vs {}",
            parent_2.len()
        )));
    }
    if len < 2 {
        return Err(Error::invalid_input(format!(
            "crossover needs at least 2 rows per parent, got {len}"
        )));
    }
    Ok(len)
}

fn shift_constant(command: Command, offset: usize) -> Command {
    match command {
        Command::Constant(ConstantRef::Concrete(idx)) => {
            Command::Constant(ConstantRef::Concrete(idx + offset))
        }
        other => other,
    }
}

fn splice(head: &[Command], tail: &[Command]) -> Vec<Command> {
    head.iter().chain(tail).copied().collect()
}
