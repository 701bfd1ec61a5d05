//! # recon-yookassa
//!
//! YooKassa processor integration for recon-gate.
//!
//! This crate provides:
//!
//! 1. **YookassaClient** — `ProcessorClient` over the payments API
//!    - deterministic `Idempotence-Key` per (order, amount, currency)
//!    - bounded request timeout, classified failure modes
//!
//! 2. **Webhook verification** — HMAC-SHA256 over the raw body, then
//!    parsing into the typed `WebhookEvent`
//!
//! 3. **Status mapping** — the total `map_status` function with an explicit
//!    capture-phase hint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recon_yookassa::{map_status, verify, YookassaClient};
//! use recon_core::CapturePhase;
//!
//! let client = YookassaClient::from_env()?;
//! let intent = client.create_intent(&request).await?;
//! let mapping = map_status(&intent.status, CapturePhase::PreCapture);
//!
//! // In the webhook endpoint:
//! let event = verify(&body, signature, &config.webhook_secret)?;
//! ```

pub mod client;
pub mod config;
pub mod status;
pub mod webhook;

// Re-exports
pub use client::YookassaClient;
pub use config::GatewayConfig;
pub use status::{
    map_status, ACTION_REQUIRED_STATUSES, FAILED_STATUSES, PROCESSING_STATUS, SUCCESS_STATUS,
};
pub use webhook::{
    verify, WEBHOOK_CANCELED_EVENT, WEBHOOK_REFUND_EVENT, WEBHOOK_SUCCESS_EVENT,
};
