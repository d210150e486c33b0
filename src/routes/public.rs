use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that render without a session. They still read the session, if any, to
/// tailor the menu. Login and logout live here because they are what moves the console
/// between the unauthenticated and authenticated states.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe, answers "ok" without touching the backend.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(handlers::home))
        .route("/ayuda", get(handlers::help))
        // GET shows the form (or bounces a logged-in operator), POST submits it.
        .route("/login", get(handlers::login_screen).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/session", get(handlers::session_summary))
        .route("/menu", get(handlers::menu))
        // POST /navigation/resolve
        // The guard's verdict for an arbitrary path, for client-side routers.
        .route("/navigation/resolve", post(handlers::resolve_navigation))
}
