//! Request admission: rate limiting.
//!
//! Anti-forgery tokens are part of the session itself, see
//! [`crate::session::CsrfToken`].

pub mod rate_limit;
