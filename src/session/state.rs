//! Per-session calculator state: token, bounded history, request handling.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::calculator::{self, CalcError, Operand, Operation, parse_operand};

use super::token::CsrfToken;

/// One successful computation, kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// `"{num1} {symbol} {num2}"` built from the parsed operands, each
    /// written with [`calculator::display_number`].
    pub equation: String,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

/// Where a request ended up in the handling state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    /// Plain page view, nothing submitted.
    #[default]
    Idle,
    /// Token mismatch. Inputs echoed, nothing else happened.
    Rejected,
    /// Validation or arithmetic failed.
    Failed,
    /// Result computed and recorded in history.
    Computed,
}

/// Transient state of a single request, consumed by the page renderer.
///
/// Raw inputs are echoed back untouched so the form can be re-filled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestState {
    pub num1: String,
    pub num2: String,
    pub operation: String,
    pub result: Option<f64>,
    pub error: Option<CalcError>,
    pub status: RequestStatus,
}

impl RequestState {
    /// Empty form.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    fn echo(num1: &str, num2: &str, operation: &str) -> Self {
        Self {
            num1: num1.to_owned(),
            num2: num2.to_owned(),
            operation: operation.to_owned(),
            ..Self::default()
        }
    }

    fn fail(mut self, error: CalcError) -> Self {
        self.error = Some(error);
        self.status = RequestStatus::Failed;
        self
    }

    /// Result formatted for the result panel, if there is one.
    #[must_use]
    pub fn formatted_result(&self) -> Option<String> {
        self.result.map(calculator::format_result)
    }

    /// User-facing error message, if there is one.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }
}

/// Everything the server remembers about one client.
///
/// The token is generated once and never changes. History is
/// most-recent-first and never longer than `max_history`.
#[derive(Debug, Clone)]
pub struct CalculatorSession {
    token: CsrfToken,
    history: Vec<HistoryEntry>,
    max_history: usize,
    last_activity: DateTime<Utc>,
}

impl CalculatorSession {
    /// New session with a freshly generated token.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self::with_token(CsrfToken::generate(), max_history)
    }

    /// New session with a known token.
    #[must_use]
    pub fn with_token(token: CsrfToken, max_history: usize) -> Self {
        Self {
            token,
            history: Vec::new(),
            max_history,
            last_activity: Utc::now(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &CsrfToken {
        &self.token
    }

    /// Past computations, most recent first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Record activity now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        // Negative means clock skew; treat as fresh.
        (Utc::now() - self.last_activity)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// Empty the history if `presented_token` matches.
    ///
    /// Returns whether the history was cleared. A mismatch is a silent no-op.
    pub fn clear_history(&mut self, presented_token: &str) -> bool {
        if !self.token.verify(presented_token) {
            return false;
        }
        self.history.clear();
        true
    }

    /// Validate and compute one submitted operation.
    ///
    /// A token mismatch echoes the inputs and does nothing else. Otherwise
    /// every check runs and each failure overwrites the previous one, so the
    /// last failing check decides the message.
    pub fn compute(
        &mut self,
        presented_token: &str,
        num1_raw: &str,
        num2_raw: &str,
        operation: &str,
    ) -> RequestState {
        let mut state = RequestState::echo(num1_raw, num2_raw, operation);
        if !self.token.verify(presented_token) {
            state.status = RequestStatus::Rejected;
            return state;
        }

        let lhs = parse_operand(num1_raw);
        let rhs = parse_operand(num2_raw);
        let op = Operation::from_key(operation);

        let mut error = None;
        if lhs.is_none() {
            error = Some(CalcError::InvalidNumber(Operand::First));
        }
        if rhs.is_none() {
            error = Some(CalcError::InvalidNumber(Operand::Second));
        }
        if op.is_none() {
            error = Some(CalcError::InvalidOperation);
        }

        let (Some(lhs), Some(rhs), Some(op)) = (lhs, rhs, op) else {
            return state.fail(error.unwrap_or(CalcError::InvalidOperation));
        };

        match op.apply(lhs, rhs) {
            Ok(result) => {
                let equation = format!(
                    "{} {} {}",
                    calculator::display_number(lhs),
                    op.symbol(),
                    calculator::display_number(rhs)
                );
                self.record(equation, result);
                state.result = Some(result);
                state.status = RequestStatus::Computed;
                state
            }
            Err(e) => state.fail(e),
        }
    }

    fn record(&mut self, equation: String, result: f64) {
        self.history.insert(
            0,
            HistoryEntry {
                equation,
                result,
                timestamp: Utc::now(),
            },
        );
        self.history.truncate(self.max_history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::MAX_HISTORY;

    const TOKEN: &str = "test-token";

    fn session() -> CalculatorSession {
        CalculatorSession::with_token(CsrfToken::from_string(TOKEN), MAX_HISTORY)
    }

    #[test]
    fn test_compute_each_operation() {
        let mut s = session();
        for (op, expected) in [("Sum", 8.0), ("Sub", 4.0), ("Mul", 12.0), ("Div", 3.0)] {
            let state = s.compute(TOKEN, "6", "2", op);
            assert_eq!(state.status, RequestStatus::Computed);
            assert_eq!(state.result, Some(expected));
            assert_eq!(state.error, None);
        }
        assert_eq!(s.history().len(), 4);
        assert_eq!(s.history()[0].equation, "6 ÷ 2");
        assert_eq!(s.history()[3].equation, "6 + 2");
    }

    #[test]
    fn test_equation_uses_parsed_values() {
        let mut s = session();
        let state = s.compute(TOKEN, " 2.50 ", "+1e1", "Mul");
        assert_eq!(state.result, Some(25.0));
        assert_eq!(s.history()[0].equation, "2.5 × 10");

        s.compute(TOKEN, "1e20", "3", "Div");
        assert_eq!(s.history()[0].equation, "1.0E+20 ÷ 3");
        // Raw inputs come back untouched.
        assert_eq!(state.num1, " 2.50 ");
        assert_eq!(state.num2, "+1e1");
    }

    #[test]
    fn test_division_by_zero() {
        let mut s = session();
        let state = s.compute(TOKEN, "5", "0", "Div");
        assert_eq!(state.error, Some(CalcError::DivisionByZero));
        assert_eq!(state.error_message().as_deref(), Some("Division by zero"));
        assert_eq!(state.result, None);
        assert_eq!(state.status, RequestStatus::Failed);
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_validation_messages() {
        let mut s = session();
        let cases = [
            ("abc", "2", "Sum", "First number is invalid"),
            ("2", "abc", "Sum", "Second number is invalid"),
            ("2", "3", "Foo", "Invalid operation selected"),
        ];
        for (num1, num2, op, message) in cases {
            let state = s.compute(TOKEN, num1, num2, op);
            assert_eq!(state.error_message().as_deref(), Some(message));
            assert_eq!(state.result, None);
        }
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_last_validation_error_wins() {
        let mut s = session();
        let state = s.compute(TOKEN, "x", "y", "Sum");
        assert_eq!(state.error, Some(CalcError::InvalidNumber(Operand::Second)));

        let state = s.compute(TOKEN, "x", "y", "Pow");
        assert_eq!(state.error, Some(CalcError::InvalidOperation));

        let state = s.compute(TOKEN, "x", "2", "Pow");
        assert_eq!(state.error, Some(CalcError::InvalidOperation));
    }

    #[test]
    fn test_token_mismatch_is_inert() {
        let mut s = session();
        s.compute(TOKEN, "1", "1", "Sum");

        let state = s.compute("wrong", "abc", "0", "Div");
        assert_eq!(state.status, RequestStatus::Rejected);
        assert_eq!(state.error, None);
        assert_eq!(state.result, None);
        assert_eq!(state.num1, "abc");
        assert_eq!(state.num2, "0");
        assert_eq!(state.operation, "Div");
        assert_eq!(s.history().len(), 1);

        let state = s.compute("", "2", "2", "Sum");
        assert_eq!(state.status, RequestStatus::Rejected);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn test_history_is_bounded_most_recent_first() {
        let mut s = session();
        for i in 1..=8 {
            s.compute(TOKEN, &i.to_string(), "0", "Sum");
        }
        let equations: Vec<_> = s.history().iter().map(|e| e.equation.as_str()).collect();
        assert_eq!(
            equations,
            ["8 + 0", "7 + 0", "6 + 0", "5 + 0", "4 + 0"]
        );
    }

    #[test]
    fn test_custom_history_capacity() {
        let mut s = CalculatorSession::with_token(CsrfToken::from_string(TOKEN), 2);
        for _ in 0..4 {
            s.compute(TOKEN, "1", "1", "Sum");
        }
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_clear_history() {
        let mut s = session();
        s.compute(TOKEN, "1", "2", "Sum");
        s.compute(TOKEN, "3", "4", "Sum");

        assert!(!s.clear_history("wrong"));
        assert_eq!(s.history().len(), 2);

        assert!(s.clear_history(TOKEN));
        assert!(s.history().is_empty());

        // Idempotent on an empty history.
        assert!(s.clear_history(TOKEN));
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_token_is_stable() {
        let mut s = CalculatorSession::new(MAX_HISTORY);
        let token = s.token().clone();
        let presented = token.as_str().to_owned();
        s.compute(&presented, "1", "2", "Sum");
        s.clear_history(&presented);
        assert_eq!(s.token(), &token);
    }

    #[test]
    fn test_formatted_result() {
        let mut s = session();
        assert_eq!(
            s.compute(TOKEN, "20", "3", "Div").formatted_result().as_deref(),
            Some("6.6667")
        );
        assert_eq!(
            s.compute(TOKEN, "3", "2", "Mul").formatted_result().as_deref(),
            Some("6")
        );
        assert_eq!(RequestState::idle().formatted_result(), None);
    }

    #[test]
    fn test_expiry() {
        let mut s = session();
        assert!(!s.is_expired_with_timeout(Duration::from_secs(60)));
        s.last_activity = Utc::now() - chrono::Duration::seconds(120);
        assert!(s.is_expired_with_timeout(Duration::from_secs(60)));
        s.touch();
        assert!(!s.is_expired_with_timeout(Duration::from_secs(60)));
    }
}
