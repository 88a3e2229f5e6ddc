use anyhow::Context;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;

use tracing::{debug, info, warn};

use crate::AppState;
use crate::calculator::Operation;
use crate::config::{AppConfig, SessionConfig};
use crate::security::rate_limit::rate_limit_middleware;
use crate::session::{RequestState, RequestStatus, SessionHandle};
use crate::ui::{PageView, render_page};

/// Largest accepted form body. The calculator form is a handful of short fields.
const MAX_FORM_BYTES: usize = 16 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = AppState::new(Arc::clone(&config));

    let sweeper = state.sessions.spawn_sweeper(
        config.session.sweep_interval(),
        config.session.idle_timeout(),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        name: "server.started",
        address = %addr,
        max_history = config.calculator.max_history,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the application router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    // A very long timeout stands in for "disabled" so the layer stack keeps one type.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(state.config.resilience.request_timeout_secs)
    };

    Router::new()
        .route("/", get(calculator_page).post(calculator_submit))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(name: "server.signal_failed", error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Session plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// Find the caller's session from its cookie, or start a new one.
///
/// The returned jar carries a fresh session cookie when one was created.
async fn resolve_session(state: &AppState, jar: CookieJar) -> (SessionHandle, CookieJar) {
    let presented = jar
        .get(&state.config.session.cookie_name)
        .map(|c| c.value().to_owned());
    let (handle, created) = state.sessions.resolve(presented.as_deref()).await;
    if !created {
        return (handle, jar);
    }

    info!(name: "session.created", session_id = %handle.id(), "Session created");
    let cookie = session_cookie(&state.config.session, handle.id());
    (handle, jar.add(cookie))
}

fn session_cookie(config: &SessionConfig, id: &str) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Submitted form. Missing fields are empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculatorForm {
    token: String,
    num1: String,
    num2: String,
    operation: String,
    /// Presence alone selects "clear history".
    clear_history: Option<String>,
}

/// GET / - Render the idle form.
async fn calculator_page(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (handle, jar) = resolve_session(&state, jar).await;
    let mut session = handle.lock().await;
    session.touch();

    let html = render_page(&PageView {
        token: session.token().as_str(),
        state: &RequestState::idle(),
        history: session.history(),
    });
    (jar, Html(html))
}

/// POST / - Compute, or clear history and redirect.
async fn calculator_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CalculatorForm>,
) -> Response {
    let (handle, jar) = resolve_session(&state, jar).await;
    let mut session = handle.lock().await;
    session.touch();

    if form.clear_history.is_some() {
        if session.clear_history(&form.token) {
            info!(name: "history.cleared", session_id = %handle.id(), "History cleared");
        } else {
            warn!(
                name: "csrf.token_mismatch",
                session_id = %handle.id(),
                action = "clear_history",
                "Ignoring request with invalid token"
            );
        }
        return (jar, Redirect::to("/")).into_response();
    }

    let request = session.compute(&form.token, &form.num1, &form.num2, &form.operation);
    match request.status {
        RequestStatus::Computed => info!(
            name: "calc.computed",
            session_id = %handle.id(),
            operator = %Operation::from_key(&form.operation).map_or('?', Operation::operator),
            result = ?request.result,
            history_len = session.history().len(),
            "Computation recorded"
        ),
        RequestStatus::Failed => debug!(
            name: "calc.rejected_input",
            session_id = %handle.id(),
            error = ?request.error,
            "Computation failed validation"
        ),
        RequestStatus::Rejected => warn!(
            name: "csrf.token_mismatch",
            session_id = %handle.id(),
            action = "compute",
            "Ignoring request with invalid token"
        ),
        RequestStatus::Idle => {}
    }

    let html = render_page(&PageView {
        token: session.token().as_str(),
        state: &request,
        history: session.history(),
    });
    (jar, Html(html)).into_response()
}
