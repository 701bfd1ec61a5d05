//! # Processor Client Trait
//!
//! Seam between the reconciliation engine and the external payment
//! processor. Implementations wrap the processor's HTTP API; the engine only
//! sees typed intents and classified errors.

use crate::error::GatewayResult;
use crate::intent::{IntentRequest, PaymentIntent};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote processor boundary.
///
/// Calls may block on the network; implementations must apply a bounded
/// timeout and classify a timeout as a retryable network error. Once
/// `create_intent` has been issued it cannot be locally cancelled — callers
/// await the terminal webhook or re-fetch the intent instead.
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    /// Create a payment intent on the processor.
    ///
    /// Must be idempotent with respect to retried checkout submissions for
    /// the same (order, amount, currency).
    async fn create_intent(&self, request: &IntentRequest) -> GatewayResult<PaymentIntent>;

    /// Fetch the current intent record by identifier.
    async fn fetch_intent(&self, intent_id: &str) -> GatewayResult<PaymentIntent>;

    /// Processor name (for logging)
    fn processor_name(&self) -> &'static str;
}

/// Type alias for a shared client handle (dynamic dispatch)
pub type SharedProcessorClient = Arc<dyn ProcessorClient>;
