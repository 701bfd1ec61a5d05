//! # Webhook Event Types
//!
//! Typed form of a verified processor notification. The raw body and
//! signature are kept on the event for re-verification and audit.

use crate::intent::Currency;
use crate::payment::PaymentMethodInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Webhook event kinds the engine acts on.
///
/// Anything else the processor sends is structurally accepted as
/// `Unknown` and routed to a no-op, so new upstream kinds never break
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    /// Charge completed
    PaymentSucceeded,
    /// Charge canceled by the processor or the customer
    PaymentCanceled,
    /// Refund issued against a completed charge
    ChargeRefunded,
    /// Unrecognized kind (passthrough)
    Unknown(String),
}

impl WebhookEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventKind::PaymentSucceeded => "payment.succeeded",
            WebhookEventKind::PaymentCanceled => "payment.canceled",
            WebhookEventKind::ChargeRefunded => "charge.refunded",
            WebhookEventKind::Unknown(kind) => kind.as_str(),
        }
    }
}

/// Embedded view of the intent carried in the event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSnapshot {
    /// Processor intent identifier
    pub intent_id: String,
    /// Provider-reported status at delivery time
    pub status: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    /// Currency
    pub currency: Currency,
    /// Customer identifier, if the processor included one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Payment method descriptor, if the envelope included one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethodInfo>,
}

/// A verified, parsed webhook event.
///
/// The processor may redeliver the same logical event under the same
/// `event_id`; the deduplicator keys on that identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Unique event identifier (stable across redeliveries)
    pub event_id: String,

    /// Event kind
    pub kind: WebhookEventKind,

    /// Intent snapshot embedded in the envelope
    pub intent: IntentSnapshot,

    /// Signature header as received (audit)
    pub signature: String,

    /// Raw body as received (audit / re-verification)
    pub raw_body: Vec<u8>,

    /// When this delivery was accepted
    pub received_at: DateTime<Utc>,
}
