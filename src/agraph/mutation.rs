//! Mutation operators for command graphs.
//!
//! Each call applies exactly one of four edits to a copy of the parent:
//!
//! - **command**: replace a whole row with a freshly generated one
//! - **node**: swap a row's opcode for another of the same kind and arity
//! - **parameter**: redraw a row's operands, keeping its opcode
//! - **prune**: bypass an operator row by wiring its consumers to one of its
//!   own operands
//!
//! Edits target rows that contribute to the output; changing an unused row
//! would leave the expression as it was.

use crate::agraph::command::{Command, Opcode, Operator};
use crate::agraph::component::ComponentGenerator;
use crate::agraph::graph::CommandGraph;
use crate::error::{Error, Result, check_probability};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Attempts at finding a row edit that actually changes something.
const MAX_REDRAWS: usize = 32;

/// Relative weights of the four mutation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Weight of whole-command replacement.
    pub command_probability: f64,
    /// Weight of opcode replacement.
    pub node_probability: f64,
    /// Weight of operand resampling.
    pub parameter_probability: f64,
    /// Weight of branch pruning.
    pub prune_probability: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            command_probability: 0.2,
            node_probability: 0.2,
            parameter_probability: 0.4,
            prune_probability: 0.2,
        }
    }
}

impl MutationConfig {
    /// A configuration that always applies `kind`.
    #[must_use]
    pub fn only(kind: MutationKind) -> Self {
        let mut config = Self {
            command_probability: 0.0,
            node_probability: 0.0,
            parameter_probability: 0.0,
            prune_probability: 0.0,
        };
        match kind {
            MutationKind::Command => config.command_probability = 1.0,
            MutationKind::Node => config.node_probability = 1.0,
            MutationKind::Parameter => config.parameter_probability = 1.0,
            MutationKind::Prune => config.prune_probability = 1.0,
        }
        config
    }

    fn weights(&self) -> [f64; 4] {
        [
            self.command_probability,
            self.node_probability,
            self.parameter_probability,
            self.prune_probability,
        ]
    }

    /// Check that every weight is a probability and at least one is positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        check_probability("command_probability", self.command_probability)?;
        check_probability("node_probability", self.node_probability)?;
        check_probability("parameter_probability", self.parameter_probability)?;
        check_probability("prune_probability", self.prune_probability)?;
        if self.weights().iter().all(|&w| w == 0.0) {
            return Err(Error::validation(
                "at least one mutation probability must be positive",
            ));
        }
        Ok(())
    }
}

/// The four mutation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Replace a whole row.
    Command,
    /// Replace a row's opcode.
    Node,
    /// Resample a row's operands.
    Parameter,
    /// Bypass an operator row.
    Prune,
}

impl MutationKind {
    /// All strategies, in the order of [`MutationConfig`]'s weights.
    pub const ALL: [Self; 4] = [Self::Command, Self::Node, Self::Parameter, Self::Prune];
}

/// Mutation operator for command graphs.
#[derive(Debug, Clone)]
pub struct AgraphMutation<G> {
    generator: G,
    manual_constants: bool,
    config: MutationConfig,
    strategy: WeightedIndex<f64>,
}

impl<G: ComponentGenerator> AgraphMutation<G> {
    /// Create a mutation operator.
    ///
    /// The generator is probed once: it must emit a terminal for row 0 and,
    /// when constants are manual, a finite numerical constant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a probability is not a finite number
    /// in `[0, 1]`, all probabilities are zero, or the generator probe fails.
    pub fn new(generator: G, config: MutationConfig) -> Result<Self> {
        config.validate()?;
        let strategy = WeightedIndex::new(config.weights())
            .map_err(|e| Error::validation(format!("invalid mutation weights: {e}")))?;

        let manual_constants = !generator.automatic_constant_optimization();
        let mut probe = SmallRng::seed_from_u64(0);
        if !generator.random_command(0, &mut probe).is_terminal() {
            return Err(Error::validation(
                "component generator produced an operator for row 0",
            ));
        }
        if manual_constants {
            let value = generator.random_numerical_constant(&mut probe);
            if !value.is_finite() {
                return Err(Error::validation(format!(
                    "component generator produced a non-finite constant: {value}"
                )));
            }
        }

        log::debug!("mutation operator: {config:?}, manual constants: {manual_constants}");
        Ok(Self {
            generator,
            manual_constants,
            config,
            strategy,
        })
    }

    /// The strategy weights in use.
    #[must_use]
    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    /// Draw a strategy according to the configured weights.
    pub fn choose_kind<R: Rng>(&self, rng: &mut R) -> MutationKind {
        MutationKind::ALL[self.strategy.sample(rng)]
    }

    /// Mutate a copy of `parent` with a randomly drawn strategy.
    ///
    /// The child keeps the parent's genetic age and has no cached fitness.
    #[must_use]
    pub fn mutate<R: Rng>(&self, parent: &CommandGraph, rng: &mut R) -> CommandGraph {
        let kind = self.choose_kind(rng);
        self.mutate_with(kind, parent, rng)
    }

    /// Mutate a copy of `parent` with the given strategy.
    #[must_use]
    pub fn mutate_with<R: Rng>(
        &self,
        kind: MutationKind,
        parent: &CommandGraph,
        rng: &mut R,
    ) -> CommandGraph {
        let mut child = parent.copy();
        child.clear_fitness();

        let edited = match kind {
            MutationKind::Command => self.redraw_row(&mut child, rng, Self::propose_command),
            MutationKind::Node => self.redraw_row(&mut child, rng, Self::propose_node),
            MutationKind::Parameter => self.redraw_row(&mut child, rng, Self::propose_parameters),
            MutationKind::Prune => prune_branch(&mut child, rng),
        };

        match edited {
            Some(row) => log::trace!("{kind:?} mutation at row {row}"),
            None => log::trace!("{kind:?} mutation found nothing to change"),
        }

        // A prune that found nothing leaves the child identical to the parent.
        if kind != MutationKind::Prune || edited.is_some() {
            if self.manual_constants {
                child.fill_pending_constants(|| self.generator.random_numerical_constant(rng));
            }
            child.compact_constants();
        }
        child
    }

    /// Apply the first effective proposal among random utilized rows.
    fn redraw_row<R: Rng>(
        &self,
        child: &mut CommandGraph,
        rng: &mut R,
        propose: fn(&Self, usize, Command, &mut R) -> Option<Command>,
    ) -> Option<usize> {
        let rows = child.utilized_rows();
        for _ in 0..MAX_REDRAWS {
            let &row = rows.choose(rng)?;
            let old = child.commands()[row];
            if let Some(new) = propose(self, row, old, rng) {
                child.set_command(row, new);
                return Some(row);
            }
        }
        None
    }

    fn propose_command<R: Rng>(&self, row: usize, old: Command, rng: &mut R) -> Option<Command> {
        let new = self.generator.random_command(row, rng);
        let both_constants =
            old.opcode() == Opcode::Constant && new.opcode() == Opcode::Constant;
        (new != old && !both_constants).then_some(new)
    }

    fn propose_node<R: Rng>(&self, _row: usize, old: Command, rng: &mut R) -> Option<Command> {
        match old {
            Command::Load(_) | Command::Constant(_) => {
                match (old.opcode(), self.generator.random_terminal(rng)) {
                    (Opcode::Constant, Opcode::Load) => {
                        Some(Command::Load(self.generator.random_feature(rng)))
                    }
                    (Opcode::Load, Opcode::Constant) => Some(Command::PENDING_CONSTANT),
                    _ => None,
                }
            }
            Command::Unary(op, a) => match self.generator.random_operator(1, rng)? {
                Operator::Unary(new) if new != op => Some(Command::Unary(new, a)),
                _ => None,
            },
            Command::Binary(op, a, b) => match self.generator.random_operator(2, rng)? {
                Operator::Binary(new) if new != op => Some(Command::Binary(new, a, b)),
                _ => None,
            },
        }
    }

    fn propose_parameters<R: Rng>(
        &self,
        row: usize,
        old: Command,
        rng: &mut R,
    ) -> Option<Command> {
        let new = match old {
            Command::Load(_) => Command::Load(self.generator.random_feature(rng)),
            // Manual constants get a fresh value; automatic ones belong to the
            // external optimizer and are never touched here.
            Command::Constant(_) if self.manual_constants => Command::PENDING_CONSTANT,
            Command::Constant(_) => return None,
            Command::Unary(op, _) => Command::Unary(op, self.generator.random_operand(row, rng)),
            Command::Binary(op, _, _) => Command::Binary(
                op,
                self.generator.random_operand(row, rng),
                self.generator.random_operand(row, rng),
            ),
        };
        (new != old).then_some(new)
    }
}

/// Bypass one consumed operator row, returning its index.
///
/// Every later reference to the pruned row is redirected to one of the pruned
/// row's own operands, which always lies earlier in the graph.
fn prune_branch<R: Rng>(graph: &mut CommandGraph, rng: &mut R) -> Option<usize> {
    let utilized = graph.utilized_commands();
    let commands = graph.commands();

    let mut consumed = vec![false; commands.len()];
    for (row, command) in commands.iter().enumerate() {
        if utilized[row] {
            for operand in command.operands().into_iter().flatten() {
                consumed[operand] = true;
            }
        }
    }
    let eligible: Vec<usize> = (0..commands.len())
        .filter(|&row| utilized[row] && consumed[row] && !commands[row].is_terminal())
        .collect();

    let &pruned = eligible.choose(rng)?;
    let operands: Vec<usize> = commands[pruned].operands().into_iter().flatten().collect();
    let &replacement = operands.choose(rng)?;

    for row in pruned + 1..graph.len() {
        let mut command = graph.commands()[row];
        let mut rewired = false;
        for operand in command.operands_mut() {
            if *operand == pruned {
                *operand = replacement;
                rewired = true;
            }
        }
        if rewired {
            graph.set_command(row, command);
        }
    }
    Some(pruned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use crate::agraph::command::{BinaryOperator, ConstantRef, UnaryOperator};
    use crate::agraph::component::{BasicComponentGenerator, ComponentConfig};
    use crate::optimization::ContinuousLocalOptimization;

    fn components(automatic: bool) -> BasicComponentGenerator {
        BasicComponentGenerator::new(&ComponentConfig {
            input_dimension: 2,
            terminal_probability: 0.3,
            constant_probability: Some(0.5),
            automatic_constant_optimization: automatic,
            operators: ["+", "-", "*", "sin", "cos"].map(String::from).to_vec(),
            ..ComponentConfig::default()
        })
        .unwrap()
    }

    fn sample_graph() -> CommandGraph {
        let mut graph = CommandGraph::new(
            vec![
                Command::Load(0),
                Command::Load(1),
                Command::Constant(ConstantRef::Concrete(0)),
                Command::Binary(BinaryOperator::Add, 0, 2),
                Command::Unary(UnaryOperator::Sin, 3),
                Command::Binary(BinaryOperator::Multiply, 4, 1),
                Command::Binary(BinaryOperator::Subtract, 5, 3),
            ],
            vec![1.5],
        )
        .unwrap();
        graph.set_genetic_age(4);
        graph.set_fitness(0.75);
        graph
    }

    fn terminal_output_graph() -> CommandGraph {
        CommandGraph::new(
            vec![
                Command::Load(1),
                Command::PENDING_CONSTANT,
                Command::Binary(BinaryOperator::Subtract, 1, 1),
                Command::Binary(BinaryOperator::Multiply, 0, 2),
                Command::Load(0),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    /// Rows whose expression changed; constants compare by value.
    fn changed_rows(parent: &CommandGraph, child: &CommandGraph) -> usize {
        (0..parent.len())
            .filter(|&row| {
                let (p, c) = (parent.commands()[row], child.commands()[row]);
                if p.opcode() == Opcode::Constant && c.opcode() == Opcode::Constant {
                    parent.constant_value(row) != child.constant_value(row)
                } else {
                    p != c
                }
            })
            .count()
    }

    fn changed_opcodes(parent: &CommandGraph, child: &CommandGraph) -> usize {
        parent
            .commands()
            .iter()
            .zip(child.commands())
            .filter(|(p, c)| p.opcode() != c.opcode())
            .count()
    }

    #[test]
    fn test_rejects_invalid_probabilities() {
        for index in 0..4 {
            for bad in [-1.0, 2.5, f64::NAN, f64::INFINITY] {
                let mut weights = [0.25; 4];
                weights[index] = bad;
                let config = MutationConfig {
                    command_probability: weights[0],
                    node_probability: weights[1],
                    parameter_probability: weights[2],
                    prune_probability: weights[3],
                };
                assert!(matches!(
                    AgraphMutation::new(components(true), config),
                    Err(Error::Validation(_))
                ));
            }
        }
    }

    #[test]
    fn test_rejects_all_zero_probabilities() {
        let config = MutationConfig {
            command_probability: 0.0,
            node_probability: 0.0,
            parameter_probability: 0.0,
            prune_probability: 0.0,
        };
        assert!(AgraphMutation::new(components(true), config).is_err());
    }

    #[test]
    fn test_genetic_age_kept_and_fitness_reset() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mutation = AgraphMutation::new(components(true), MutationConfig::default()).unwrap();
        let parent = sample_graph();

        for _ in 0..20 {
            let child = mutation.mutate(&parent, &mut rng);
            assert_eq!(child.genetic_age(), parent.genetic_age());
            assert_eq!(child.fitness(), None);
            assert_eq!(parent.fitness(), Some(0.75));
            child.validate().unwrap();
        }
    }

    #[test]
    fn test_single_point_mutations() {
        let mut rng = SmallRng::seed_from_u64(0);
        let parent = sample_graph();

        for kind in [MutationKind::Command, MutationKind::Node, MutationKind::Parameter] {
            for automatic in [true, false] {
                let mutation =
                    AgraphMutation::new(components(automatic), MutationConfig::only(kind)).unwrap();
                for _ in 0..10 {
                    let child = mutation.mutate(&parent, &mut rng);
                    assert_eq!(changed_rows(&parent, &child), 1, "{kind:?} changed != 1 row");
                }
            }
        }
    }

    #[test]
    fn test_node_mutation_changes_only_opcodes() {
        let mut rng = SmallRng::seed_from_u64(2);
        let parent = sample_graph();
        let node = AgraphMutation::new(components(true), MutationConfig::only(MutationKind::Node))
            .unwrap();
        let parameter = AgraphMutation::new(
            components(true),
            MutationConfig::only(MutationKind::Parameter),
        )
        .unwrap();

        for _ in 0..10 {
            let child = node.mutate(&parent, &mut rng);
            assert_eq!(changed_opcodes(&parent, &child), 1);

            let child = parameter.mutate(&parent, &mut rng);
            assert_eq!(changed_opcodes(&parent, &child), 0);
            assert_ne!(child.commands(), parent.commands());
        }
    }

    #[test]
    fn test_parameter_mutation_keeps_graph_acyclic() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mutation = AgraphMutation::new(
            components(true),
            MutationConfig::only(MutationKind::Parameter),
        )
        .unwrap();
        let mut graph = sample_graph();

        for _ in 0..50 {
            graph = mutation.mutate(&graph, &mut rng);
            for (row, command) in graph.commands().iter().enumerate() {
                assert!(command.is_valid_at(row));
            }
        }
    }

    #[test]
    fn test_pruning_mutation() {
        let mut rng = SmallRng::seed_from_u64(10);
        let mutation =
            AgraphMutation::new(components(true), MutationConfig::only(MutationKind::Prune))
                .unwrap();
        let parent = sample_graph();

        for _ in 0..10 {
            let child = mutation.mutate(&parent, &mut rng);
            let mut before = Vec::new();
            let mut after = Vec::new();
            for (p, c) in parent.commands().iter().zip(child.commands()) {
                assert_eq!(p.opcode(), c.opcode());
                for (p_operand, c_operand) in p.operands().into_iter().zip(c.operands()) {
                    if p_operand != c_operand {
                        before.push(p_operand);
                        after.push(c_operand);
                    }
                }
            }
            assert!(!before.is_empty());
            assert!(before.iter().all(|v| *v == before[0]));
            assert!(after.iter().all(|v| *v == after[0]));
            assert!(after[0] < before[0]);
        }
    }

    #[test]
    fn test_pruning_without_eligible_rows_is_noop() {
        let mut rng = SmallRng::seed_from_u64(10);
        let mutation =
            AgraphMutation::new(components(true), MutationConfig::only(MutationKind::Prune))
                .unwrap();
        let parent = terminal_output_graph();

        for _ in 0..5 {
            let child = mutation.mutate(&parent, &mut rng);
            assert_eq!(child, parent);
        }
    }

    #[test]
    fn test_parameter_mutation_of_constant_graph() {
        let mut parent =
            CommandGraph::new(vec![Command::Constant(ConstantRef::Concrete(0))], vec![1.0])
                .unwrap();
        parent.set_genetic_age(1);

        for automatic in [true, false] {
            let mut rng = SmallRng::seed_from_u64(10);
            let generator = BasicComponentGenerator::new(&ComponentConfig {
                input_dimension: 2,
                terminal_probability: 1.0,
                constant_probability: Some(1.0),
                automatic_constant_optimization: automatic,
                ..ComponentConfig::default()
            })
            .unwrap();
            let mutation =
                AgraphMutation::new(generator, MutationConfig::only(MutationKind::Parameter))
                    .unwrap();

            let child = mutation.mutate(&parent, &mut rng);

            assert_eq!(child.commands(), parent.commands());
            if automatic {
                assert_eq!(child.constants(), parent.constants());
            } else {
                assert_eq!(child.constants().len(), 1);
                assert_ne!(child.constants(), parent.constants());
            }
        }
    }

    #[test]
    fn test_new_manual_constants_added() {
        for kind in [MutationKind::Command, MutationKind::Node] {
            let mut rng = SmallRng::seed_from_u64(0);
            let generator = BasicComponentGenerator::new(&ComponentConfig {
                input_dimension: 2,
                terminal_probability: 1.0,
                constant_probability: Some(1.0),
                automatic_constant_optimization: false,
                ..ComponentConfig::default()
            })
            .unwrap();
            let mutation = AgraphMutation::new(generator, MutationConfig::only(kind)).unwrap();
            let parent = CommandGraph::new(
                vec![
                    Command::Load(1),
                    Command::Load(0),
                    Command::Binary(BinaryOperator::Subtract, 1, 1),
                    Command::Binary(BinaryOperator::Multiply, 0, 2),
                    Command::Load(0),
                ],
                Vec::new(),
            )
            .unwrap();

            let child = mutation.mutate(&parent, &mut rng);

            assert_eq!(child.num_constants(), 1);
            assert_eq!(child.constants().len(), 1);
            assert!(!child.needs_continuous_opt());
        }
    }

    #[test]
    fn test_repeated_manual_mutations_stay_consistent() {
        let mut rng = SmallRng::seed_from_u64(0);
        let generator = BasicComponentGenerator::new(&ComponentConfig {
            input_dimension: 2,
            automatic_constant_optimization: false,
            operators: vec!["+".into()],
            ..ComponentConfig::default()
        })
        .unwrap();
        let mutation = AgraphMutation::new(generator, MutationConfig::default()).unwrap();
        let mut graph = CommandGraph::new(
            vec![
                Command::Constant(ConstantRef::Concrete(0)),
                Command::PENDING_CONSTANT,
                Command::PENDING_CONSTANT,
                Command::Binary(BinaryOperator::Add, 1, 2),
                Command::Binary(BinaryOperator::Add, 3, 0),
            ],
            vec![1.0, 4.0],
        )
        .unwrap();

        for _ in 0..20 {
            graph = mutation.mutate(&graph, &mut rng);
            assert_eq!(graph.num_constants(), graph.constants().len());
            assert!(graph.find_pending_constants().is_empty());
        }
    }

    fn manual_prune() -> AgraphMutation<BasicComponentGenerator> {
        AgraphMutation::new(components(false), MutationConfig::only(MutationKind::Prune)).unwrap()
    }

    fn prunable_graph(constant: ConstantRef, constants: Vec<f64>) -> CommandGraph {
        CommandGraph::new(
            vec![
                Command::Load(0),
                Command::Constant(constant),
                Command::Binary(BinaryOperator::Add, 0, 1),
                Command::Binary(BinaryOperator::Multiply, 2, 2),
            ],
            constants,
        )
        .unwrap()
    }

    #[test]
    fn test_manual_pruning_fills_pending_constants() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mutation = manual_prune();
        let parent = prunable_graph(ConstantRef::Pending, Vec::new());

        for _ in 0..10 {
            let child = mutation.mutate(&parent, &mut rng);
            assert!(child.find_pending_constants().is_empty());
            assert!(!child.needs_continuous_opt());
            assert_eq!(child.num_constants(), child.constants().len());
        }
    }

    #[test]
    fn test_manual_pruning_compacts_widened_store() {
        let mut rng = SmallRng::seed_from_u64(12);
        let mutation = manual_prune();
        let mut parent = prunable_graph(ConstantRef::Concrete(0), vec![1.0]);
        parent.set_constants(vec![1.0, 2.0, 3.0]).unwrap();

        for _ in 0..10 {
            let child = mutation.mutate(&parent, &mut rng);
            assert_eq!(child.num_constants(), 1);
            assert_eq!(child.constants(), &[1.0]);
        }
    }

    #[test]
    fn test_choose_kind_respects_zero_weights() {
        let mut rng = SmallRng::seed_from_u64(5);
        let config = MutationConfig {
            command_probability: 0.0,
            node_probability: 0.5,
            parameter_probability: 0.0,
            prune_probability: 0.5,
        };
        let mutation = AgraphMutation::new(components(true), config).unwrap();

        for _ in 0..200 {
            let kind = mutation.choose_kind(&mut rng);
            assert!(matches!(kind, MutationKind::Node | MutationKind::Prune));
        }
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config: MutationConfig = serde_json::from_str(r#"{"prune_probability": 0.0}"#).unwrap();
        assert_eq!(config.command_probability, 0.2);
        assert_eq!(config.prune_probability, 0.0);
        config.validate().unwrap();
    }
}
