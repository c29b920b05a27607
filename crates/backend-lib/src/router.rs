// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers;
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = state.settings.request_timeout();

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1/auth", auth_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/verify-otp", post(handlers::auth::verify_otp))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/google/login", get(handlers::oauth::login_redirect))
        .route("/google/callback", get(handlers::oauth::callback))
}
