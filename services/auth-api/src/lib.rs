//! Keyward Auth API
//!
//! HTTP front for the token and session lifecycle.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/signup` - Register and log in
//! - `POST /api/v1/login` - Log in with email and password
//! - `POST /api/v1/login/external` - Log in with an identity provider credential
//! - `POST /api/v1/refresh` - Rotate a session's refresh token
//! - `POST /api/v1/logout` - End the session for one app
//! - `GET /api/v1/me` - Identity carried by the access token
//! - `GET /api/v1/sessions` - Apps with a live session
//! - `POST /api/v1/change-password` - Change password
//! - `POST /api/v1/forgot-password` - Request a reset token
//! - `POST /api/v1/reset-password` - Redeem a reset token
//! - `GET /api/v1/key/public` - Token verification key
//! - `GET /api/v1/key/token/{id}` - Collect a parked token pair
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod notifier;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use crate::config::{Config, ConfigError, LogFormat};
pub use crate::state::AppState;

/// Build the HTTP router over the given state
pub fn build_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        // Session lifecycle
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/login/external", post(handlers::login_external))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/sessions", get(handlers::sessions))
        // Passwords
        .route("/change-password", post(handlers::change_password))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
        // Keys and token handoff
        .route("/key/public", get(handlers::public_key))
        .route("/key/token/{id}", get(handlers::collect_tokens));

    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .with_state(state)
}
