//! # recon-core
//!
//! Core types and the reconciliation state machine for the recon-gate
//! payment integration.
//!
//! This crate provides:
//! - `Payment`, `PaymentIntent`, `WebhookEvent`, `GatewayResponse` data model
//! - `ProcessorClient` trait for the external processor boundary
//! - `PaymentStore` / `DedupStore` traits with in-memory implementations
//! - `Reconciler`, the state machine both delivery paths converge on
//! - `GatewayError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use recon_core::{Currency, Reconciler};
//!
//! // Checkout path
//! let payment = reconciler.begin_payment("ord_1", 1000, Currency::RUB).await?;
//! let result = client.create_intent(&request).await
//!     .map(|intent| { let m = map_status(&intent.status, CapturePhase::PreCapture); (intent, m) });
//! let response = reconciler.record_intent_result(&payment.id, result).await?;
//!
//! // Webhook path
//! let event = verify(&body, signature, &config.webhook_secret)?;
//! let outcome = reconciler.apply_webhook_event(&event).await?;
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod intent;
pub mod payment;
pub mod reconcile;
pub mod store;

// Re-exports for convenience
pub use client::{ProcessorClient, SharedProcessorClient};
pub use error::{GatewayError, GatewayResult};
pub use event::{IntentSnapshot, WebhookEvent, WebhookEventKind};
pub use intent::{
    CaptureMode, CapturePhase, Currency, IntentRequest, PaymentIntent, ResultKind, StatusMapping,
};
pub use payment::{
    ActionRequiredData, GatewayResponse, Payment, PaymentMethodInfo, PaymentState,
};
pub use reconcile::{Reconciler, WebhookOutcome};
pub use store::{
    DedupStore, MemoryDedupStore, MemoryPaymentStore, PaymentStore, SharedDedupStore,
    SharedPaymentStore,
};
