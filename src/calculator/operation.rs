//! The fixed operator table.

use super::CalcError;

/// One of the four supported binary operations.
///
/// The form submits the key (`Sum`, `Sub`, ...). The symbol is what the
/// page and the history show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sum,
    Sub,
    Mul,
    Div,
}

impl Operation {
    /// All operations in the order the form renders their buttons.
    pub const ALL: [Self; 4] = [Self::Sum, Self::Sub, Self::Mul, Self::Div];

    /// Form key submitted by the operation button.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
        }
    }

    /// ASCII operator, recorded in the `calc.computed` log event.
    #[must_use]
    pub const fn operator(self) -> char {
        match self {
            Self::Sum => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    /// Display symbol used in equations and on buttons.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Sum => "+",
            Self::Sub => "-",
            Self::Mul => "×",
            Self::Div => "÷",
        }
    }

    /// Look up an operation by its exact form key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Apply the operation using native `f64` arithmetic.
    pub fn apply(self, lhs: f64, rhs: f64) -> Result<f64, CalcError> {
        match self {
            Self::Sum => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div if rhs == 0.0 => Err(CalcError::DivisionByZero),
            Self::Div => Ok(lhs / rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup_is_exact() {
        assert_eq!(Operation::from_key("Sum"), Some(Operation::Sum));
        assert_eq!(Operation::from_key("Div"), Some(Operation::Div));
        assert_eq!(Operation::from_key("sum"), None);
        assert_eq!(Operation::from_key(" Sum"), None);
        assert_eq!(Operation::from_key(""), None);
        assert_eq!(Operation::from_key("Foo"), None);
    }

    #[test]
    fn test_symbols() {
        let symbols: Vec<_> = Operation::ALL.iter().map(|op| op.symbol()).collect();
        assert_eq!(symbols, ["+", "-", "×", "÷"]);
        let operators: String = Operation::ALL.iter().map(|op| op.operator()).collect();
        assert_eq!(operators, "+-*/");
    }

    #[test]
    fn test_apply() {
        assert_eq!(Operation::Sum.apply(2.0, 3.0), Ok(5.0));
        assert_eq!(Operation::Sub.apply(2.0, 3.0), Ok(-1.0));
        assert_eq!(Operation::Mul.apply(2.5, 4.0), Ok(10.0));
        assert_eq!(Operation::Div.apply(9.0, 3.0), Ok(3.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(Operation::Div.apply(5.0, 0.0), Err(CalcError::DivisionByZero));
        assert_eq!(Operation::Div.apply(5.0, -0.0), Err(CalcError::DivisionByZero));
        // Only Div cares about a zero right-hand side.
        assert_eq!(Operation::Mul.apply(5.0, 0.0), Ok(0.0));
    }
}
