//! Anti-forgery tokens.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes in a token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Per-session anti-forgery token.
///
/// Rendered into every form as a hidden field and required back on every
/// state-mutating request. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a fresh token from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap an existing token value.
    #[must_use]
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Token value as embedded in forms.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a presented token against this one in constant time.
    #[must_use]
    pub fn verify(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}

/// Length is not secret; content is compared without early exit.
fn constant_time_eq(expected: &[u8], presented: &[u8]) -> bool {
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
