//! Arithmetic core.
//!
//! Everything here is pure: operand validation, the fixed operator table and
//! result formatting. Session state and anti-forgery checks live in
//! [`crate::session`].
//!
//! # Example
//!
//! ```rust
//! use session_calculator::calculator::{Operation, format_result, parse_operand};
//!
//! let lhs = parse_operand(" 20 ").unwrap();
//! let rhs = parse_operand("3").unwrap();
//! let result = Operation::Div.apply(lhs, rhs).unwrap();
//! assert_eq!(format_result(result), "6.6667");
//! ```

mod error;
mod number;
mod operation;

pub use error::{CalcError, Operand};
pub use number::{display_number, format_result, is_numeric, parse_operand, trim_operand};
pub use operation::Operation;

/// Default number of history entries kept per session.
pub const MAX_HISTORY: usize = 5;
