//! The command graph chromosome.
//!
//! A command graph is a stack-like sequence of rows. Row `i` may only consume
//! rows `< i`, and the last row is the output of the expression. Constant
//! terminals index into a parallel constants store, or are pending until an
//! external optimizer supplies their value.

use crate::agraph::command::{Command, ConstantRef};
use crate::error::{Error, Result};
use crate::optimization::ContinuousLocalOptimization;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An acyclic graph of commands encoding one expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandGraph {
    commands: Vec<Command>,
    constants: Vec<f64>,
    #[serde(default)]
    genetic_age: u64,
    #[serde(default)]
    fitness: Option<f64>,
}

impl CommandGraph {
    /// Create a graph from rows and a constants store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if there are no rows, if an operator row
    /// references a row at or after itself, or if a concrete constant index is
    /// outside the store.
    pub fn new(commands: Vec<Command>, constants: Vec<f64>) -> Result<Self> {
        let graph = Self {
            commands,
            constants,
            genetic_age: 0,
            fitness: None,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Build a graph whose invariants the caller has already established.
    pub(crate) fn from_parts(commands: Vec<Command>, constants: Vec<f64>, genetic_age: u64) -> Self {
        debug_assert!(!commands.is_empty());
        Self {
            commands,
            constants,
            genetic_age,
            fitness: None,
        }
    }

    /// Check the structural invariants of this graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.commands.is_empty() {
            return Err(Error::invalid_input("a command graph needs at least one row"));
        }
        for (row, command) in self.commands.iter().enumerate() {
            if !command.is_valid_at(row) {
                return Err(Error::invalid_input(format!(
                    "row {row} ({command}) references a row at or after itself"
                )));
            }
            if let Command::Constant(ConstantRef::Concrete(idx)) = command
                && *idx >= self.constants.len()
            {
                return Err(Error::invalid_input(format!(
                    "row {row} references constant {idx} but the store holds {}",
                    self.constants.len()
                )));
            }
        }
        Ok(())
    }

    /// Return a fully independent copy of this graph.
    ///
    /// Rows, constants, genetic age and fitness cache are all duplicated;
    /// nothing is shared with `self`.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// The rows of this graph, in evaluation order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The row at `row`, if it exists.
    #[must_use]
    pub fn command(&self, row: usize) -> Option<&Command> {
        self.commands.get(row)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the graph has no rows. Validated graphs never do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Replace the row at `row`, clearing the fitness cache.
    pub(crate) fn set_command(&mut self, row: usize, command: Command) {
        debug_assert!(command.is_valid_at(row));
        self.commands[row] = command;
        self.fitness = None;
    }

    /// The constants store.
    #[must_use]
    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    /// Number of distinct store entries referenced by constant rows.
    #[must_use]
    pub fn num_constants(&self) -> usize {
        let mut seen = vec![false; self.constants.len()];
        for command in &self.commands {
            if let Command::Constant(ConstantRef::Concrete(idx)) = command
                && let Some(flag) = seen.get_mut(*idx)
            {
                *flag = true;
            }
        }
        seen.into_iter().filter(|&flag| flag).count()
    }

    /// Replace the constants store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `constants` is too short to cover
    /// every concrete constant index referenced by a row. The graph is left
    /// unchanged in that case.
    pub fn set_constants(&mut self, constants: Vec<f64>) -> Result<()> {
        if let Some(highest) = self.highest_constant_index()
            && highest >= constants.len()
        {
            return Err(Error::invalid_input(format!(
                "constant {highest} is referenced but only {} values were given",
                constants.len()
            )));
        }
        self.constants = constants;
        self.fitness = None;
        Ok(())
    }

    /// Append a value to the store, returning its index.
    pub(crate) fn push_constant(&mut self, value: f64) -> usize {
        self.constants.push(value);
        self.fitness = None;
        self.constants.len() - 1
    }

    fn highest_constant_index(&self) -> Option<usize> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::Constant(ConstantRef::Concrete(idx)) => Some(*idx),
                _ => None,
            })
            .max()
    }

    /// Resolved value of a constant row, if it is concrete.
    #[must_use]
    pub fn constant_value(&self, row: usize) -> Option<f64> {
        match self.commands.get(row)? {
            Command::Constant(ConstantRef::Concrete(idx)) => self.constants.get(*idx).copied(),
            _ => None,
        }
    }

    /// Rows holding a constant whose value is still pending, in row order.
    #[must_use]
    pub fn find_pending_constants(&self) -> Vec<usize> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, command)| **command == Command::PENDING_CONSTANT)
            .map(|(row, _)| row)
            .collect()
    }

    /// Give every pending constant row a freshly drawn concrete value.
    ///
    /// Values are drawn in row order and appended to the store.
    pub(crate) fn fill_pending_constants(&mut self, mut draw: impl FnMut() -> f64) {
        for row in self.find_pending_constants() {
            let idx = self.push_constant(draw());
            self.commands[row] = Command::Constant(ConstantRef::Concrete(idx));
        }
    }

    /// Drop unreferenced store entries and renumber the rest.
    ///
    /// Indices are reassigned in order of first reference by row. Every row
    /// resolves to the same value afterwards. A concrete index outside the
    /// store becomes pending.
    pub(crate) fn compact_constants(&mut self) {
        let mut remap: Vec<Option<usize>> = vec![None; self.constants.len()];
        let mut compacted = Vec::new();

        for command in &mut self.commands {
            let Command::Constant(slot) = command else {
                continue;
            };
            let ConstantRef::Concrete(old) = *slot else {
                continue;
            };
            *slot = match (remap.get(old).copied().flatten(), self.constants.get(old)) {
                (Some(new), _) => ConstantRef::Concrete(new),
                (None, Some(&value)) => {
                    let new = compacted.len();
                    compacted.push(value);
                    remap[old] = Some(new);
                    ConstantRef::Concrete(new)
                }
                (None, None) => ConstantRef::Pending,
            };
        }

        if compacted != self.constants {
            self.constants = compacted;
            self.fitness = None;
        }
    }

    /// Lineage age propagated by the genetic operators.
    #[must_use]
    pub fn genetic_age(&self) -> u64 {
        self.genetic_age
    }

    /// Set the lineage age.
    pub fn set_genetic_age(&mut self, age: u64) {
        self.genetic_age = age;
    }

    /// Cached fitness, if an evaluator has set one since the last change.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Cache a fitness value computed by an external evaluator.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Forget the cached fitness.
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Mask of rows that contribute to the output (the last row).
    #[must_use]
    pub fn utilized_commands(&self) -> Vec<bool> {
        let mut utilized = vec![false; self.commands.len()];
        if let Some(last) = utilized.last_mut() {
            *last = true;
        }
        for row in (0..self.commands.len()).rev() {
            if !utilized[row] {
                continue;
            }
            for operand in self.commands[row].operands().into_iter().flatten() {
                utilized[operand] = true;
            }
        }
        utilized
    }

    /// Indices of the rows that contribute to the output.
    #[must_use]
    pub fn utilized_rows(&self) -> Vec<usize> {
        self.utilized_commands()
            .into_iter()
            .enumerate()
            .filter_map(|(row, used)| used.then_some(row))
            .collect()
    }

    /// Number of rows contributing to the output.
    #[must_use]
    pub fn complexity(&self) -> usize {
        self.utilized_commands().into_iter().filter(|&used| used).count()
    }
}

impl fmt::Display for CommandGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let utilized = self.utilized_commands();
        let mut rendered: Vec<String> = Vec::with_capacity(self.commands.len());
        for (row, command) in self.commands.iter().enumerate() {
            if !utilized[row] {
                rendered.push(String::new());
                continue;
            }
            let text = match command {
                Command::Load(_) | Command::Constant(_) => command.to_string(),
                Command::Unary(op, a) => format!("{}({})", op.name(), rendered[*a]),
                Command::Binary(op, a, b) => {
                    format!("({} {} {})", rendered[*a], op.symbol(), rendered[*b])
                }
            };
            rendered.push(text);
        }
        write!(f, "{}", rendered.last().map_or("", String::as_str))
    }
}

impl ContinuousLocalOptimization for CommandGraph {
    fn get_number_local_optimization_params(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| **command == Command::PENDING_CONSTANT)
            .count()
    }

    /// Assigning a value consumes its slot, so a full assignment leaves no
    /// slots and later calls change nothing. Optimizers that evaluate several
    /// trial vectors should set them on clones of the unassigned graph.
    fn set_local_optimization_params(&mut self, params: &[f64]) {
        let pending = self.find_pending_constants();
        for (&row, &value) in pending.iter().zip(params) {
            let idx = self.push_constant(value);
            self.commands[row] = Command::Constant(ConstantRef::Concrete(idx));
        }
    }
}
