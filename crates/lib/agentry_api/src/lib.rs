//! # agentry_api
//!
//! HTTP API library for Agentry.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use agentry_core::gate::VerificationGate;

use crate::handlers::{agents, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token verification gate; owns the agent store and identity provider.
    pub gate: VerificationGate,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new().route(routes::GET_API_HEALTH, get(health::health_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_API_AGENTS_ME, get(agents::current_agent_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
