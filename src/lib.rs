//! Session Calculator
//!
//! A server-rendered arithmetic calculator. Each client session gets an
//! anti-forgery token and a short rolling history of its computations.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server, one route serving the form (GET) and its submissions (POST)
//! - **Sessions**: in-memory store keyed by a cookie-carried session id
//! - **UI**: plain server-rendered HTML, no client-side scripting
//!
//! # Modules
//!
//! - [`calculator`]: operator table, operand validation, result formatting
//! - [`session`]: calculator sessions, anti-forgery tokens and the session store
//! - [`ui`]: HTML rendering
//! - [`server`]: router, handlers and middleware
//! - [`security`]: rate limiting
//! - [`config`]: layered configuration

pub mod calculator;
pub mod config;
pub mod security;
pub mod server;
pub mod session;
pub mod ui;

use crate::config::AppConfig;
use crate::security::rate_limit::SimpleRateLimiter;

use session::SessionStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Session store holding every client's token and history.
    pub sessions: SessionStore,
    /// Global Rate Limiter
    pub rate_limiter: Arc<SimpleRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build fresh state from configuration.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            sessions: SessionStore::with_max_history(config.calculator.max_history),
            rate_limiter: Arc::new(SimpleRateLimiter::new(
                config.resilience.requests_per_second,
                config.resilience.burst_size,
            )),
            config,
        }
    }
}
