//! # Payment Entity and Gateway Response
//!
//! The platform-side `Payment` record and the `GatewayResponse` snapshot the
//! checkout flow consumes. Payments are mutated exclusively by the
//! reconciliation state machine; terminal states are immutable.

use crate::intent::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PaymentState {
    /// Charge initiated, no intent result recorded yet
    Initiated,
    /// Awaiting customer interaction (redirect confirmation etc.)
    Pending { action_required: bool },
    /// Processor is settling the funds
    Processing,
    /// Charge completed (terminal)
    Succeeded,
    /// Charge failed (terminal)
    Failed,
    /// Charge canceled (terminal)
    Canceled,
}

impl PaymentState {
    /// Terminal states are never overwritten
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::Succeeded | PaymentState::Failed | PaymentState::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Initiated => "initiated",
            PaymentState::Pending { .. } => "pending",
            PaymentState::Processing => "processing",
            PaymentState::Succeeded => "succeeded",
            PaymentState::Failed => "failed",
            PaymentState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal payment identifier
    pub id: String,

    /// Platform order this payment charges
    pub order_id: String,

    /// Weak reference to the processor intent, by identifier only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,

    /// Current lifecycle state
    pub state: PaymentState,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Currency
    pub currency: Currency,

    /// Accumulated error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Identifier of the last webhook event applied to this record (audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<String>,

    /// Set when a `charge.refunded` event was recorded against a succeeded
    /// payment; does not affect the state machine
    #[serde(default)]
    pub refunded: bool,

    /// Optimistic concurrency version, bumped on every store update
    pub version: u64,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Create a new payment in `Initiated` state with a generated id
    pub fn new(order_id: impl Into<String>, amount: i64, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            intent_id: None,
            state: PaymentState::Initiated,
            amount,
            currency,
            error: None,
            last_event_id: None,
            refunded: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the payment counts as successful for the checkout surface:
    /// `Succeeded`, or `Processing` with no accumulated error.
    pub fn is_success(&self) -> bool {
        match self.state {
            PaymentState::Succeeded => true,
            PaymentState::Processing => self.error.is_none(),
            _ => false,
        }
    }

    /// Whether the customer still has an action to perform
    pub fn action_required(&self) -> bool {
        matches!(
            self.state,
            PaymentState::Pending {
                action_required: true
            }
        )
    }
}

/// Payment method descriptor, one tagged variant per supported kind.
///
/// The `Unknown` variant keeps the response forward compatible with methods
/// the processor may add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum PaymentMethodInfo {
    BankCard { brand: String, last4: String },
    Wallet { provider: String },
    SbpTransfer,
    Unknown { kind: String },
}

/// Redirect/confirmation data the customer needs to complete the payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequiredData {
    /// URL to redirect the customer to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
    /// Token the client confirms with, when the flow is token-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
}

/// Snapshot of a payment outcome handed to the order system after each
/// applied intent result or webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// True iff the payment is `Succeeded` or `Processing` with no error
    pub is_success: bool,

    /// True when the customer must complete a confirmation step
    pub action_required: bool,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Currency
    pub currency: Currency,

    /// Platform transaction identifier (the payment id)
    pub transaction_id: String,

    /// Human-readable error, when the outcome is a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Redirect/confirmation payload, present when `action_required`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_required_data: Option<ActionRequiredData>,

    /// Processor-side customer identifier, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// Processor reference (the intent id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,

    /// Payment method descriptor, if the processor reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_info: Option<PaymentMethodInfo>,
}

impl GatewayResponse {
    /// Snapshot the current state of a payment record
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            is_success: payment.is_success(),
            action_required: payment.action_required(),
            amount: payment.amount,
            currency: payment.currency,
            transaction_id: payment.id.clone(),
            error: payment.error.clone(),
            action_required_data: None,
            customer_id: None,
            psp_reference: payment.intent_id.clone(),
            payment_method_info: None,
        }
    }

    /// Attach redirect/confirmation data
    pub fn with_action_data(mut self, data: ActionRequiredData) -> Self {
        self.action_required_data = Some(data);
        self
    }

    /// Attach the processor customer id
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Attach the payment method descriptor
    pub fn with_payment_method(mut self, info: PaymentMethodInfo) -> Self {
        self.payment_method_info = Some(info);
        self
    }

    /// Failure response for an intent-creation error; nothing was persisted,
    /// so there is no payment snapshot to take.
    pub fn from_error(
        amount: i64,
        currency: Currency,
        transaction_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            is_success: false,
            action_required: false,
            amount,
            currency,
            transaction_id: transaction_id.into(),
            error: Some(message.into()),
            action_required_data: None,
            customer_id: None,
            psp_reference: None,
            payment_method_info: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PaymentState::Succeeded.is_terminal());
        assert!(PaymentState::Failed.is_terminal());
        assert!(PaymentState::Canceled.is_terminal());
        assert!(!PaymentState::Initiated.is_terminal());
        assert!(!PaymentState::Processing.is_terminal());
        assert!(!PaymentState::Pending {
            action_required: true
        }
        .is_terminal());
    }

    #[test]
    fn test_is_success_rules() {
        let mut payment = Payment::new("ord_1", 1000, Currency::RUB);
        assert!(!payment.is_success());

        payment.state = PaymentState::Processing;
        assert!(payment.is_success());

        payment.error = Some("late decline".to_string());
        assert!(!payment.is_success());

        payment.state = PaymentState::Succeeded;
        assert!(payment.is_success());
    }

    #[test]
    fn test_response_snapshot() {
        let mut payment = Payment::new("ord_2", 2500, Currency::RUB);
        payment.intent_id = Some("pi_42".to_string());
        payment.state = PaymentState::Pending {
            action_required: true,
        };

        let response = GatewayResponse::from_payment(&payment);
        assert!(!response.is_success);
        assert!(response.action_required);
        assert_eq!(response.amount, 2500);
        assert_eq!(response.psp_reference.as_deref(), Some("pi_42"));
        assert_eq!(response.transaction_id, payment.id);
    }
}
