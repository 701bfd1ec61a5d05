//! # Webhook Verification
//!
//! Authentication and parsing of inbound processor notifications. The
//! signature is an HMAC-SHA256 digest of the raw body under the channel's
//! webhook secret; nothing is parsed until the digest matches, so spoofed
//! payloads never reach the JSON layer.

use crate::client::decimal_to_minor_units;
use chrono::Utc;
use recon_core::{
    Currency, GatewayError, GatewayResult, IntentSnapshot, PaymentMethodInfo, WebhookEvent,
    WebhookEventKind,
};
use serde::Deserialize;
use tracing::debug;

/// Event names the processor documents for this integration
pub const WEBHOOK_SUCCESS_EVENT: &str = "payment.succeeded";
pub const WEBHOOK_CANCELED_EVENT: &str = "payment.canceled";
pub const WEBHOOK_REFUND_EVENT: &str = "charge.refunded";

/// Verify an inbound delivery and parse it into a typed event.
///
/// Signature mismatch discards the payload before parsing. A body that
/// passes the signature but is not a recognizable envelope is rejected as
/// malformed; an envelope with an unrecognized `event` string is accepted
/// with `WebhookEventKind::Unknown` so new upstream kinds stay deliverable.
pub fn verify(
    raw_body: &[u8],
    signature_header: &str,
    webhook_secret: &str,
) -> GatewayResult<WebhookEvent> {
    let expected = compute_hmac_sha256(webhook_secret, raw_body);
    if !constant_time_compare(signature_header.trim(), &expected) {
        return Err(GatewayError::InvalidSignature);
    }

    let envelope: EventEnvelope = serde_json::from_slice(raw_body)
        .map_err(|e| GatewayError::MalformedBody(e.to_string()))?;

    let kind = match envelope.event.as_str() {
        WEBHOOK_SUCCESS_EVENT => WebhookEventKind::PaymentSucceeded,
        WEBHOOK_CANCELED_EVENT => WebhookEventKind::PaymentCanceled,
        WEBHOOK_REFUND_EVENT => WebhookEventKind::ChargeRefunded,
        other => WebhookEventKind::Unknown(other.to_string()),
    };

    let currency = envelope
        .object
        .amount
        .currency
        .parse::<Currency>()
        .map_err(GatewayError::MalformedBody)?;
    let amount = decimal_to_minor_units(&envelope.object.amount.value)
        .map_err(|e| GatewayError::MalformedBody(e.to_string()))?;

    debug!(event_id = %envelope.id, kind = kind.as_str(), "Verified webhook event");

    Ok(WebhookEvent {
        event_id: envelope.id,
        kind,
        intent: IntentSnapshot {
            intent_id: envelope.object.id,
            status: envelope.object.status,
            amount,
            currency,
            customer_id: envelope.object.customer_id,
            payment_method: envelope.object.payment_method.map(map_payment_method),
        },
        signature: signature_header.to_string(),
        raw_body: raw_body.to_vec(),
        received_at: Utc::now(),
    })
}

fn map_payment_method(method: PaymentMethodEnvelope) -> PaymentMethodInfo {
    match method.kind.as_str() {
        "bank_card" => {
            let card = method.card.unwrap_or_default();
            PaymentMethodInfo::BankCard {
                brand: card.card_type,
                last4: card.last4,
            }
        }
        "yoo_money" | "qiwi" | "webmoney" => PaymentMethodInfo::Wallet {
            provider: method.kind,
        },
        "sbp" => PaymentMethodInfo::SbpTransfer,
        _ => PaymentMethodInfo::Unknown { kind: method.kind },
    }
}

fn compute_hmac_sha256(secret: &str, message: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// =============================================================================
// Envelope Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    event: String,
    object: IntentEnvelope,
}

#[derive(Debug, Deserialize)]
struct IntentEnvelope {
    id: String,
    status: String,
    amount: AmountEnvelope,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    payment_method: Option<PaymentMethodEnvelope>,
}

#[derive(Debug, Deserialize)]
struct AmountEnvelope {
    value: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    card: Option<CardEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
struct CardEnvelope {
    #[serde(default)]
    last4: String,
    #[serde(default)]
    card_type: String,
}
