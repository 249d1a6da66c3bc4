//! Command rows of an acyclic graph.
//!
//! Each row is either a terminal (load an input feature or a constant) or an
//! operator applied to the values of earlier rows. Operator arity is carried by
//! the variant, so a unary row has no second operand to get wrong.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a constant terminal gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantRef {
    /// Index into the graph's constants store.
    Concrete(usize),
    /// Value not known yet; supplied by the external optimizer.
    Pending,
}

/// Operators taking one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Log,
    /// Absolute value.
    Abs,
    /// Square root.
    Sqrt,
}

impl UnaryOperator {
    /// Every unary operator, in opcode order.
    pub const ALL: [Self; 6] = [
        Self::Sin,
        Self::Cos,
        Self::Exp,
        Self::Log,
        Self::Abs,
        Self::Sqrt,
    ];

    /// Function name used in formatted formulas.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
        }
    }
}

/// Operators taking two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// Addition.
    Add,
    /// Subtraction.
    Subtract,
    /// Multiplication.
    Multiply,
    /// Division.
    Divide,
    /// Exponentiation.
    Power,
}

impl BinaryOperator {
    /// Every binary operator, in opcode order.
    pub const ALL: [Self; 5] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Power,
    ];

    /// Infix symbol used in formatted formulas.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
        }
    }
}

/// Any operator, tagged by arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// One-operand operator.
    Unary(UnaryOperator),
    /// Two-operand operator.
    Binary(BinaryOperator),
}

impl Operator {
    /// Number of operands this operator consumes.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }

    /// Parse an operator from its symbol or name (`"+"`, `"add"`, `"sin"`, ...).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name.trim().to_ascii_lowercase().as_str() {
            "+" | "add" | "addition" => Self::Binary(BinaryOperator::Add),
            "-" | "subtract" | "subtraction" => Self::Binary(BinaryOperator::Subtract),
            "*" | "multiply" | "multiplication" => Self::Binary(BinaryOperator::Multiply),
            "/" | "divide" | "division" => Self::Binary(BinaryOperator::Divide),
            "^" | "pow" | "power" => Self::Binary(BinaryOperator::Power),
            "sin" | "sine" => Self::Unary(UnaryOperator::Sin),
            "cos" | "cosine" => Self::Unary(UnaryOperator::Cos),
            "exp" | "exponential" => Self::Unary(UnaryOperator::Exp),
            "log" | "logarithm" => Self::Unary(UnaryOperator::Log),
            "abs" | "absolute" => Self::Unary(UnaryOperator::Abs),
            "sqrt" | "root" => Self::Unary(UnaryOperator::Sqrt),
            _ => return None,
        };
        Some(op)
    }
}

/// The opcode column of a row, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Input feature load.
    Load,
    /// Constant load.
    Constant,
    /// Unary operator.
    Unary(UnaryOperator),
    /// Binary operator.
    Binary(BinaryOperator),
}

impl Opcode {
    /// Whether this opcode is a terminal (no row operands).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Load | Self::Constant)
    }
}

/// A single row of a command graph.
///
/// Operand fields of operator rows are indices of earlier rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Load input feature `X_i`.
    Load(usize),
    /// Load a constant.
    Constant(ConstantRef),
    /// Apply a unary operator to an earlier row.
    Unary(UnaryOperator, usize),
    /// Apply a binary operator to two earlier rows.
    Binary(BinaryOperator, usize, usize),
}

impl Command {
    /// A constant terminal awaiting its value.
    pub const PENDING_CONSTANT: Self = Self::Constant(ConstantRef::Pending);

    /// Build an operator row from an operator and its operand rows.
    ///
    /// `rhs` is ignored for unary operators.
    #[must_use]
    pub fn operation(op: Operator, lhs: usize, rhs: usize) -> Self {
        match op {
            Operator::Unary(u) => Self::Unary(u, lhs),
            Operator::Binary(b) => Self::Binary(b, lhs, rhs),
        }
    }

    /// The opcode column of this row.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Load(_) => Opcode::Load,
            Self::Constant(_) => Opcode::Constant,
            Self::Unary(op, _) => Opcode::Unary(*op),
            Self::Binary(op, _, _) => Opcode::Binary(*op),
        }
    }

    /// The operator of this row, if it is not a terminal.
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Load(_) | Self::Constant(_) => None,
            Self::Unary(op, _) => Some(Operator::Unary(*op)),
            Self::Binary(op, _, _) => Some(Operator::Binary(*op)),
        }
    }

    /// Whether this row is a terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.opcode().is_terminal()
    }

    /// Row references consumed by this row.
    ///
    /// Terminals have none; unary rows fill only the first slot.
    #[must_use]
    pub fn operands(&self) -> [Option<usize>; 2] {
        match self {
            Self::Load(_) | Self::Constant(_) => [None, None],
            Self::Unary(_, a) => [Some(*a), None],
            Self::Binary(_, a, b) => [Some(*a), Some(*b)],
        }
    }

    /// Mutable access to the row references consumed by this row.
    pub(crate) fn operands_mut(&mut self) -> Vec<&mut usize> {
        match self {
            Self::Load(_) | Self::Constant(_) => Vec::new(),
            Self::Unary(_, a) => vec![a],
            Self::Binary(_, a, b) => vec![a, b],
        }
    }

    /// Whether every operand refers to a row strictly before `row`.
    #[must_use]
    pub fn is_valid_at(&self, row: usize) -> bool {
        self.operands().iter().flatten().all(|&operand| operand < row)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(feature) => write!(f, "X_{feature}"),
            Self::Constant(ConstantRef::Concrete(idx)) => write!(f, "C_{idx}"),
            Self::Constant(ConstantRef::Pending) => write!(f, "C_?"),
            Self::Unary(op, a) => write!(f, "{}({a})", op.name()),
            Self::Binary(op, a, b) => write!(f, "({a}) {} ({b})", op.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_by_arity() {
        assert_eq!(Command::Load(3).operands(), [None, None]);
        assert_eq!(Command::PENDING_CONSTANT.operands(), [None, None]);
        assert_eq!(
            Command::Unary(UnaryOperator::Sin, 2).operands(),
            [Some(2), None]
        );
        assert_eq!(
            Command::Binary(BinaryOperator::Add, 0, 1).operands(),
            [Some(0), Some(1)]
        );
    }

    #[test]
    fn test_validity_requires_earlier_rows() {
        let add = Command::Binary(BinaryOperator::Add, 0, 1);
        assert!(!add.is_valid_at(1));
        assert!(add.is_valid_at(2));
        // Terminals are valid anywhere, including row 0.
        assert!(Command::Load(7).is_valid_at(0));
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(
            Operator::parse("+"),
            Some(Operator::Binary(BinaryOperator::Add))
        );
        assert_eq!(
            Operator::parse(" Sin "),
            Some(Operator::Unary(UnaryOperator::Sin))
        );
        assert_eq!(Operator::parse("tanh"), None);
        assert_eq!(Operator::parse("pow").map(Operator::arity), Some(2));
    }

    #[test]
    fn test_operation_drops_rhs_for_unary() {
        let cmd = Command::operation(Operator::Unary(UnaryOperator::Exp), 4, 9);
        assert_eq!(cmd, Command::Unary(UnaryOperator::Exp, 4));
        assert_eq!(cmd.opcode(), Opcode::Unary(UnaryOperator::Exp));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::Load(0).to_string(), "X_0");
        assert_eq!(Command::PENDING_CONSTANT.to_string(), "C_?");
        assert_eq!(
            Command::Binary(BinaryOperator::Multiply, 0, 1).to_string(),
            "(0) * (1)"
        );
    }
}
