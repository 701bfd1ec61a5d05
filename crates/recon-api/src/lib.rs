//! # recon-api
//!
//! HTTP API layer for recon-gate.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout and payment-lookup endpoints
//! - The processor webhook endpoint
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout` | Create a charge |
//! | GET | `/api/v1/payments/{id}` | Payment snapshot |
//! | POST | `/api/v1/payments/{id}/refresh` | Re-fetch intent status |
//! | POST | `/webhooks/` | Processor webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
