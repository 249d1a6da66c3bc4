//! Random components for building and editing command graphs.
//!
//! The genetic operators never decide on their own which operators, features
//! or constants exist: they ask a [`ComponentGenerator`]. The generator also
//! tells them who owns constant values. With automatic constant optimization
//! new constants stay pending for the external optimizer; otherwise the
//! operators draw concrete values themselves.

use crate::agraph::command::{Command, Opcode, Operator};
use crate::error::{Error, Result, check_probability};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Source of random graph components.
///
/// Every draw takes the caller's random source explicitly, so one generator
/// can be shared by workers that each own a seeded RNG.
pub trait ComponentGenerator {
    /// Whether pending constants are filled by an external optimizer.
    ///
    /// When `false`, the operators must produce concrete constants.
    fn automatic_constant_optimization(&self) -> bool;

    /// Number of input features available to `Load` rows.
    fn input_dimension(&self) -> usize;

    /// Whether at least one operator of the given arity is available.
    fn has_operators(&self, arity: usize) -> bool;

    /// A command valid at position `row` (operands `< row`).
    ///
    /// Constant terminals are returned as [`Command::PENDING_CONSTANT`].
    fn random_command<R: Rng>(&self, row: usize, rng: &mut R) -> Command;

    /// A terminal opcode, [`Opcode::Load`] or [`Opcode::Constant`].
    fn random_terminal<R: Rng>(&self, rng: &mut R) -> Opcode;

    /// An operator of the given arity, if any is available.
    fn random_operator<R: Rng>(&self, arity: usize, rng: &mut R) -> Option<Operator>;

    /// An operand row for an operator at `row`; always `< row` when `row > 0`.
    fn random_operand<R: Rng>(&self, row: usize, rng: &mut R) -> usize;

    /// An input feature index.
    fn random_feature<R: Rng>(&self, rng: &mut R) -> usize;

    /// A concrete numeric constant.
    fn random_numerical_constant<R: Rng>(&self, rng: &mut R) -> f64;
}

impl<G: ComponentGenerator + ?Sized> ComponentGenerator for &G {
    fn automatic_constant_optimization(&self) -> bool {
        (**self).automatic_constant_optimization()
    }

    fn input_dimension(&self) -> usize {
        (**self).input_dimension()
    }

    fn has_operators(&self, arity: usize) -> bool {
        (**self).has_operators(arity)
    }

    fn random_command<R: Rng>(&self, row: usize, rng: &mut R) -> Command {
        (**self).random_command(row, rng)
    }

    fn random_terminal<R: Rng>(&self, rng: &mut R) -> Opcode {
        (**self).random_terminal(rng)
    }

    fn random_operator<R: Rng>(&self, arity: usize, rng: &mut R) -> Option<Operator> {
        (**self).random_operator(arity, rng)
    }

    fn random_operand<R: Rng>(&self, row: usize, rng: &mut R) -> usize {
        (**self).random_operand(row, rng)
    }

    fn random_feature<R: Rng>(&self, rng: &mut R) -> usize {
        (**self).random_feature(rng)
    }

    fn random_numerical_constant<R: Rng>(&self, rng: &mut R) -> f64 {
        (**self).random_numerical_constant(rng)
    }
}

/// Configuration for [`BasicComponentGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Number of input features.
    pub input_dimension: usize,
    /// Probability that a row (other than row 0) is a terminal.
    pub terminal_probability: f64,
    /// Probability that a terminal is a constant. Defaults to
    /// `1 / (input_dimension + 1)`.
    pub constant_probability: Option<f64>,
    /// Constants are drawn uniformly from `[-range, range]`.
    pub numerical_constant_range: f64,
    /// Whether constants are left pending for an external optimizer.
    pub automatic_constant_optimization: bool,
    /// Operator names or symbols (`"+"`, `"multiply"`, `"sin"`, ...).
    pub operators: Vec<String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            input_dimension: 1,
            terminal_probability: 0.1,
            constant_probability: None,
            numerical_constant_range: 100.0,
            automatic_constant_optimization: true,
            operators: vec!["+".to_string(), "-".to_string(), "*".to_string()],
        }
    }
}

/// Component generator drawing uniformly from a configured operator set.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicComponentGenerator {
    input_dimension: usize,
    terminal_probability: f64,
    constant_probability: f64,
    numerical_constant_range: f64,
    automatic_constant_optimization: bool,
    operators: Vec<Operator>,
}

impl BasicComponentGenerator {
    /// Build a generator from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input dimension is zero, a
    /// probability is outside `[0, 1]`, the constant range is not a positive
    /// finite number, or an operator name is unknown.
    pub fn new(config: &ComponentConfig) -> Result<Self> {
        if config.input_dimension == 0 {
            return Err(Error::validation("input_dimension must be at least 1"));
        }
        check_probability("terminal_probability", config.terminal_probability)?;
        #[allow(clippy::cast_precision_loss)]
        let constant_probability = config
            .constant_probability
            .unwrap_or(1.0 / (config.input_dimension as f64 + 1.0));
        check_probability("constant_probability", constant_probability)?;
        let range = config.numerical_constant_range;
        if !(range.is_finite() && range > 0.0) {
            return Err(Error::validation(format!(
                "numerical_constant_range must be positive and finite, got {range}"
            )));
        }

        let mut generator = Self {
            input_dimension: config.input_dimension,
            terminal_probability: config.terminal_probability,
            constant_probability,
            numerical_constant_range: range,
            automatic_constant_optimization: config.automatic_constant_optimization,
            operators: Vec::new(),
        };
        for name in &config.operators {
            generator.add_operator(name)?;
        }

        log::debug!(
            "component generator: {} features, {} operators, automatic constants: {}",
            generator.input_dimension,
            generator.operators.len(),
            generator.automatic_constant_optimization
        );
        Ok(generator)
    }

    /// Make an operator available, by name or symbol.
    ///
    /// Adding an operator that is already present has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name is not a known operator.
    pub fn add_operator(&mut self, name: &str) -> Result<()> {
        let op = Operator::parse(name)
            .ok_or_else(|| Error::validation(format!("unknown operator: {name:?}")))?;
        if !self.operators.contains(&op) {
            self.operators.push(op);
        }
        Ok(())
    }

    /// The available operators, in insertion order.
    #[must_use]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn random_terminal_command<R: Rng>(&self, rng: &mut R) -> Command {
        match self.random_terminal(rng) {
            Opcode::Constant => Command::PENDING_CONSTANT,
            _ => Command::Load(self.random_feature(rng)),
        }
    }
}

impl ComponentGenerator for BasicComponentGenerator {
    fn automatic_constant_optimization(&self) -> bool {
        self.automatic_constant_optimization
    }

    fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    fn has_operators(&self, arity: usize) -> bool {
        self.operators.iter().any(|op| op.arity() == arity)
    }

    fn random_command<R: Rng>(&self, row: usize, rng: &mut R) -> Command {
        if row == 0 || self.operators.is_empty() || rng.gen_bool(self.terminal_probability) {
            return self.random_terminal_command(rng);
        }
        let Some(&op) = self.operators.choose(rng) else {
            return self.random_terminal_command(rng);
        };
        let lhs = self.random_operand(row, rng);
        let rhs = if op.arity() == 2 {
            self.random_operand(row, rng)
        } else {
            lhs
        };
        Command::operation(op, lhs, rhs)
    }

    fn random_terminal<R: Rng>(&self, rng: &mut R) -> Opcode {
        if rng.gen_bool(self.constant_probability) {
            Opcode::Constant
        } else {
            Opcode::Load
        }
    }

    fn random_operator<R: Rng>(&self, arity: usize, rng: &mut R) -> Option<Operator> {
        let candidates: Vec<Operator> = self
            .operators
            .iter()
            .copied()
            .filter(|op| op.arity() == arity)
            .collect();
        candidates.choose(rng).copied()
    }

    fn random_operand<R: Rng>(&self, row: usize, rng: &mut R) -> usize {
        if row == 0 { 0 } else { rng.gen_range(0..row) }
    }

    fn random_feature<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.input_dimension)
    }

    fn random_numerical_constant<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(-self.numerical_constant_range..=self.numerical_constant_range)
    }
}
