//! Error types for command graphs and their genetic operators.

use thiserror::Error;

/// Errors raised by graph construction and the genetic operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Configuration rejected at construction time.
    ///
    /// Raised for out-of-range probabilities, generators that break their
    /// contract when probed, and malformed index lists.
    #[error("validation error: {0}")]
    Validation(String),

    /// A structural precondition was violated by the caller.
    ///
    /// Raised for forward operand references, unresolvable constant indices,
    /// and crossover parents that admit no interior cut point.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a validation error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid-input error.
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Require `value` to be a finite probability in `[0, 1]`.
pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{name} must be a number in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("command_probability must be in [0, 1]");
        assert_eq!(
            err.to_string(),
            "validation error: command_probability must be in [0, 1]"
        );

        let err = Error::invalid_input("parents need at least 2 rows");
        assert!(err.to_string().starts_with("invalid input"));
    }

    #[test]
    fn test_check_probability() {
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", -0.1).is_err());
        assert!(check_probability("p", 1.01).is_err());
        assert!(check_probability("p", f64::NAN).is_err());
        assert!(check_probability("p", f64::INFINITY).is_err());
    }
}
