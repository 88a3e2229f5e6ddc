//! User-facing calculation failures.

use std::fmt;

/// Which operand of a binary operation a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    First,
    Second,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("First"),
            Self::Second => f.write_str("Second"),
        }
    }
}

/// Expected validation and arithmetic outcomes.
///
/// None of these are system failures. The `Display` text is exactly the
/// message shown to the user in the error panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    /// An operand did not parse as a number.
    #[error("{0} number is invalid")]
    InvalidNumber(Operand),
    /// The operation key is not one of `Sum`, `Sub`, `Mul`, `Div`.
    #[error("Invalid operation selected")]
    InvalidOperation,
    /// `Div` with a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,
}
