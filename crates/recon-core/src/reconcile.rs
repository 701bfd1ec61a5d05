//! # Reconciliation State Machine
//!
//! Single source of truth for a payment's status. The synchronous checkout
//! path (intent-creation results) and the asynchronous webhook path both
//! land here, so every state decision goes through the same transition
//! rules: claim before transition, never regress out of a terminal state,
//! writes guarded by an optimistic version check.

use crate::error::{GatewayError, GatewayResult};
use crate::event::{WebhookEvent, WebhookEventKind};
use crate::intent::{Currency, PaymentIntent, ResultKind, StatusMapping};
use crate::payment::{ActionRequiredData, GatewayResponse, Payment, PaymentState};
use crate::store::{SharedDedupStore, SharedPaymentStore};
use tracing::{debug, error, info, warn};

/// CAS write retries before giving up on a contended payment record
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Outcome of applying a webhook event
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Event applied; the payment advanced or refund metadata was recorded
    Applied(GatewayResponse),
    /// Event id already claimed; acknowledged without any state change
    Duplicate,
    /// Structurally recognized but nothing to do (unknown event kind,
    /// unknown payment, refund against a non-succeeded payment)
    NoOp { reason: String },
    /// The event targeted a terminal state different from the one already
    /// reached. Never applied; flagged for manual review.
    InvalidTransition {
        from: PaymentState,
        attempted: PaymentState,
    },
}

/// The reconciliation engine
pub struct Reconciler {
    payments: SharedPaymentStore,
    dedup: SharedDedupStore,
}

impl Reconciler {
    pub fn new(payments: SharedPaymentStore, dedup: SharedDedupStore) -> Self {
        Self { payments, dedup }
    }

    /// Create the platform payment record at checkout initiation,
    /// state `Initiated`.
    pub async fn begin_payment(
        &self,
        order_id: &str,
        amount: i64,
        currency: Currency,
    ) -> GatewayResult<Payment> {
        if amount <= 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }

        let payment = Payment::new(order_id, amount, currency);
        self.payments.insert(payment.clone()).await?;
        debug!(payment_id = %payment.id, order_id, "Payment initiated");
        Ok(payment)
    }

    /// Consume the result of intent creation on the synchronous checkout
    /// path.
    ///
    /// On a creation error nothing is persisted: the response carries
    /// `is_success = false` and the user message, and the `Initiated`
    /// record is left for a later retry. On success the mapped status
    /// advances the payment out of `Initiated`; a mapping of `Unknown`
    /// attaches the intent but leaves the state untouched for delayed
    /// resolution.
    pub async fn record_intent_result(
        &self,
        payment_id: &str,
        result: Result<(PaymentIntent, StatusMapping), GatewayError>,
    ) -> GatewayResult<GatewayResponse> {
        let payment = self.load(payment_id).await?;

        let (intent, mapping) = match result {
            Ok(pair) => pair,
            Err(err) => {
                warn!(payment_id, error = %err, "Intent creation failed");
                return Ok(GatewayResponse::from_error(
                    payment.amount,
                    payment.currency,
                    payment.id,
                    err.user_message(),
                ));
            }
        };

        if intent.amount != payment.amount || intent.currency != payment.currency {
            return Err(GatewayError::InvalidRequest(format!(
                "Intent {} reports {} {} but payment {} expects {} {}",
                intent.id, intent.amount, intent.currency, payment.id, payment.amount,
                payment.currency,
            )));
        }

        let mut attempts = 0;
        loop {
            let mut current = self.load(payment_id).await?;
            let expected_version = current.version;

            if current.state.is_terminal() {
                // A refresh may race a webhook that already settled the
                // payment; the recorded outcome stands.
                debug!(
                    payment_id,
                    state = %current.state,
                    "Ignoring intent result for settled payment"
                );
                return Ok(GatewayResponse::from_payment(&current));
            }

            current.intent_id = Some(intent.id.clone());
            match mapping.kind {
                ResultKind::Pending => {
                    current.state = PaymentState::Pending {
                        action_required: mapping.action_required,
                    };
                }
                ResultKind::Processing => current.state = PaymentState::Processing,
                ResultKind::Success => {
                    current.state = PaymentState::Succeeded;
                    current.error = None;
                }
                ResultKind::Failed => {
                    current.state = PaymentState::Failed;
                    current.error = Some(format!("Provider reported status {}", intent.status));
                }
                ResultKind::Unknown => {
                    // Conservative: keep Initiated, note the status, let the
                    // webhook or a status refresh resolve it later.
                    warn!(
                        payment_id,
                        status = %intent.status,
                        "Unrecognized provider status on intent creation"
                    );
                    current.error =
                        Some(format!("Unrecognized provider status: {}", intent.status));
                }
            }

            match self.payments.update(current.clone(), expected_version).await {
                Ok(()) => {
                    current.version = expected_version + 1;
                    info!(
                        payment_id,
                        intent_id = %intent.id,
                        state = %current.state,
                        "Recorded intent result"
                    );

                    let mut response = GatewayResponse::from_payment(&current);
                    if current.action_required() {
                        response = response.with_action_data(ActionRequiredData {
                            confirmation_url: intent.confirmation_token.clone(),
                            confirmation_token: intent.confirmation_token.clone(),
                        });
                    }
                    if let Some(customer_id) = &intent.customer_id {
                        response = response.with_customer_id(customer_id);
                    }
                    return Ok(response);
                }
                Err(GatewayError::StoreConflict { .. }) if attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Apply a verified webhook event.
    ///
    /// The dedup claim is the sole synchronization point: no transition is
    /// applied unless `claim` succeeded first. Resolution of the target
    /// payment happens before the claim so that an event arriving ahead of
    /// the checkout path is left unclaimed for redelivery.
    pub async fn apply_webhook_event(&self, event: &WebhookEvent) -> GatewayResult<WebhookOutcome> {
        let intent_id = event.intent.intent_id.as_str();

        let Some(payment) = self.payments.find_by_intent(intent_id).await? else {
            warn!(
                event_id = %event.event_id,
                intent_id,
                "Webhook event for unknown payment"
            );
            return Ok(WebhookOutcome::NoOp {
                reason: format!("No payment references intent {}", intent_id),
            });
        };

        if event.intent.amount != payment.amount || event.intent.currency != payment.currency {
            return Err(GatewayError::InvalidRequest(format!(
                "Event {} reports {} {} but payment {} expects {} {}",
                event.event_id,
                event.intent.amount,
                event.intent.currency,
                payment.id,
                payment.amount,
                payment.currency,
            )));
        }

        let target = match &event.kind {
            WebhookEventKind::PaymentSucceeded => PaymentState::Succeeded,
            WebhookEventKind::PaymentCanceled => PaymentState::Canceled,
            WebhookEventKind::ChargeRefunded => {
                return self.record_refund(event, payment).await;
            }
            WebhookEventKind::Unknown(kind) => {
                debug!(event_id = %event.event_id, kind, "Ignoring unrecognized event kind");
                return Ok(WebhookOutcome::NoOp {
                    reason: format!("Unrecognized event kind {}", kind),
                });
            }
        };

        if !self.dedup.claim(&event.event_id).await? {
            debug!(event_id = %event.event_id, "Duplicate webhook delivery");
            return Ok(WebhookOutcome::Duplicate);
        }

        self.transition(event, payment, target).await
    }

    async fn transition(
        &self,
        event: &WebhookEvent,
        mut payment: Payment,
        target: PaymentState,
    ) -> GatewayResult<WebhookOutcome> {
        let mut attempts = 0;
        loop {
            if payment.state == target {
                // Same outcome delivered under a fresh event id
                debug!(
                    payment_id = %payment.id,
                    state = %payment.state,
                    "Event targets the current state"
                );
                return Ok(WebhookOutcome::NoOp {
                    reason: format!("Payment already {}", payment.state),
                });
            }

            if payment.state.is_terminal() {
                error!(
                    payment_id = %payment.id,
                    from = %payment.state,
                    attempted = %target,
                    event_id = %event.event_id,
                    "Refusing to overwrite terminal payment outcome"
                );
                return Ok(WebhookOutcome::InvalidTransition {
                    from: payment.state,
                    attempted: target,
                });
            }

            let expected_version = payment.version;
            payment.state = target;
            payment.last_event_id = Some(event.event_id.clone());
            if target == PaymentState::Succeeded {
                payment.error = None;
            }

            match self.payments.update(payment.clone(), expected_version).await {
                Ok(()) => {
                    payment.version = expected_version + 1;
                    info!(
                        payment_id = %payment.id,
                        state = %payment.state,
                        event_id = %event.event_id,
                        "Applied webhook event"
                    );
                    return Ok(WebhookOutcome::Applied(self.event_response(event, &payment)));
                }
                Err(GatewayError::StoreConflict { .. }) if attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    payment = self.load(&payment.id).await?;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Refund notification: recorded as metadata on a succeeded payment,
    /// state unchanged. Refund tracking proper is out of scope.
    async fn record_refund(
        &self,
        event: &WebhookEvent,
        mut payment: Payment,
    ) -> GatewayResult<WebhookOutcome> {
        if payment.state != PaymentState::Succeeded {
            warn!(
                payment_id = %payment.id,
                state = %payment.state,
                event_id = %event.event_id,
                "Refund event for a payment that never succeeded"
            );
            return Ok(WebhookOutcome::NoOp {
                reason: format!("Refund event for {} payment", payment.state),
            });
        }

        if !self.dedup.claim(&event.event_id).await? {
            return Ok(WebhookOutcome::Duplicate);
        }

        let mut attempts = 0;
        loop {
            let expected_version = payment.version;
            payment.refunded = true;
            payment.last_event_id = Some(event.event_id.clone());

            match self.payments.update(payment.clone(), expected_version).await {
                Ok(()) => {
                    payment.version = expected_version + 1;
                    info!(payment_id = %payment.id, "Recorded refund metadata");
                    return Ok(WebhookOutcome::Applied(self.event_response(event, &payment)));
                }
                Err(GatewayError::StoreConflict { .. }) if attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    payment = self.load(&payment.id).await?;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn event_response(&self, event: &WebhookEvent, payment: &Payment) -> GatewayResponse {
        let mut response = GatewayResponse::from_payment(payment);
        if let Some(customer_id) = &event.intent.customer_id {
            response = response.with_customer_id(customer_id);
        }
        if let Some(method) = &event.intent.payment_method {
            response = response.with_payment_method(method.clone());
        }
        response
    }

    async fn load(&self, payment_id: &str) -> GatewayResult<Payment> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or_else(|| GatewayError::PaymentNotFound {
                payment_id: payment_id.to_string(),
            })
    }
}
