//! # Routes
//!
//! Axum router configuration for the reconciliation gateway.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - POST /api/v1/checkout - Create a charge
/// - GET  /api/v1/payments/{payment_id} - Payment snapshot
/// - POST /api/v1/payments/{payment_id}/refresh - Re-fetch intent status
/// - POST /webhooks/ - Processor webhook endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/payments/{payment_id}", get(handlers::get_payment))
        .route(
            "/payments/{payment_id}/refresh",
            post(handlers::refresh_payment),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        // Webhook route takes the raw body; signature is checked over the bytes
        .route("/webhooks/", post(handlers::processor_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
