//! Calculator sessions.
//!
//! Each client gets a server-side session holding its anti-forgery token and
//! a short rolling history of computations. Sessions are identified by a
//! random UUID carried in a cookie.
//!
//! # Architecture
//!
//! - [`CalculatorSession`]: token, history and the `compute` / `clear_history` operations
//! - [`SessionStore`]: thread-safe store for all live sessions
//! - [`CsrfToken`]: anti-forgery token with constant-time comparison
//!
//! # Example
//!
//! ```rust
//! use session_calculator::session::{CalculatorSession, RequestStatus};
//!
//! let mut session = CalculatorSession::new(5);
//! let token = session.token().as_str().to_owned();
//!
//! let state = session.compute(&token, "6", "3", "Div");
//! assert_eq!(state.status, RequestStatus::Computed);
//! assert_eq!(session.history()[0].equation, "6 ÷ 3");
//!
//! // Without the right token nothing happens.
//! let state = session.compute("forged", "1", "1", "Sum");
//! assert_eq!(state.status, RequestStatus::Rejected);
//! assert_eq!(session.history().len(), 1);
//! ```

mod state;
mod store;
mod token;

pub use state::{CalculatorSession, HistoryEntry, RequestState, RequestStatus};
pub use store::{SessionHandle, SessionStore};
pub use token::CsrfToken;
