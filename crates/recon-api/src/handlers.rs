//! # Request Handlers
//!
//! Axum request handlers for the reconciliation gateway. The checkout
//! handler drives the synchronous path; the webhook handler drives the
//! asynchronous path. Both end in the same reconciler.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use recon_core::{
    CapturePhase, Currency, GatewayError, GatewayResponse, IntentRequest, WebhookOutcome,
};
use recon_yookassa::{map_status, verify};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Signature header the processor sends with each delivery
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout request
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Platform order identifier
    pub order_id: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Order description forwarded to the processor (optional)
    #[serde(default)]
    pub description: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn gateway_error_to_response(err: GatewayError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "recon-gate",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a charge: record the payment, create the processor intent, run
/// the intent result through the reconciler.
///
/// A processor-side failure still answers `200` — the outcome travels in
/// `GatewayResponse.is_success` and the error message, and nothing was
/// persisted past `Initiated`, so the caller may retry.
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<GatewayResponse>, (StatusCode, Json<ErrorResponse>)> {
    let currency: Currency = request
        .currency
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e, 400))))?;

    let payment = state
        .reconciler
        .begin_payment(&request.order_id, request.amount, currency)
        .await
        .map_err(gateway_error_to_response)?;

    let intent_request = IntentRequest {
        order_id: request.order_id.clone(),
        amount: request.amount,
        currency,
        return_url: state.gateway.return_url.clone(),
        description: request.description.clone(),
        capture_mode: state.gateway.capture_mode,
    };

    let result = state
        .client
        .create_intent(&intent_request)
        .await
        .map(|intent| {
            let mapping = map_status(&intent.status, CapturePhase::PreCapture);
            (intent, mapping)
        });

    let response = state
        .reconciler
        .record_intent_result(&payment.id, result)
        .await
        .map_err(|e| {
            error!("Failed to record intent result: {}", e);
            gateway_error_to_response(e)
        })?;

    info!(
        payment_id = %response.transaction_id,
        is_success = response.is_success,
        action_required = response.action_required,
        "Checkout processed"
    );

    Ok(Json(response))
}

/// Handle a processor webhook delivery.
///
/// `400` only for signature failures and malformed bodies. Everything that
/// was structurally recognized answers `200` — including duplicate
/// deliveries and rejected terminal overwrites — so the sender stops
/// retrying.
#[instrument(skip(state, headers, body))]
pub async fn processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing signature header", 400)),
            )
        })?;

    let event = verify(&body, signature, &state.gateway.webhook_secret).map_err(|e| {
        warn!("Webhook rejected: {}", e);
        gateway_error_to_response(e)
    })?;

    let outcome = state
        .reconciler
        .apply_webhook_event(&event)
        .await
        .map_err(|e| {
            error!("Webhook event failed: {}", e);
            gateway_error_to_response(e)
        })?;

    match outcome {
        WebhookOutcome::Applied(response) => {
            info!(
                event_id = %event.event_id,
                transaction_id = %response.transaction_id,
                "Webhook event applied"
            );
        }
        WebhookOutcome::Duplicate => {
            info!(event_id = %event.event_id, "Duplicate webhook delivery acknowledged");
        }
        WebhookOutcome::NoOp { reason } => {
            info!(event_id = %event.event_id, reason, "Webhook no-op");
        }
        WebhookOutcome::InvalidTransition { from, attempted } => {
            // Acknowledged so the sender stops retrying; flagged for review
            error!(
                event_id = %event.event_id,
                from = %from,
                attempted = %attempted,
                "Webhook event rejected: terminal outcome would be overwritten"
            );
        }
    }

    Ok(StatusCode::OK)
}

/// Re-fetch the intent from the processor and reconcile the reported
/// status. This is the recovery path for payments stuck without a webhook
/// (or parked by an unrecognized status); the capture has been attempted by
/// now, so the mapper gets the post-capture phase hint.
#[instrument(skip(state))]
pub async fn refresh_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<GatewayResponse>, (StatusCode, Json<ErrorResponse>)> {
    let payment = state
        .payments
        .get(&payment_id)
        .await
        .map_err(gateway_error_to_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Payment not found: {}", payment_id),
                    404,
                )),
            )
        })?;

    let Some(intent_id) = payment.intent_id.clone() else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Payment has no intent to refresh",
                400,
            )),
        ));
    };

    let result = state.client.fetch_intent(&intent_id).await.map(|intent| {
        let mapping = map_status(&intent.status, CapturePhase::PostCapture);
        (intent, mapping)
    });

    let response = state
        .reconciler
        .record_intent_result(&payment.id, result)
        .await
        .map_err(|e| {
            error!("Failed to record refreshed intent: {}", e);
            gateway_error_to_response(e)
        })?;

    info!(
        payment_id = %response.transaction_id,
        is_success = response.is_success,
        "Payment refreshed"
    );

    Ok(Json(response))
}

/// Get a payment snapshot
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let payment = state
        .payments
        .get(&payment_id)
        .await
        .map_err(gateway_error_to_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Payment not found: {}", payment_id),
                    404,
                )),
            )
        })?;

    Ok(Json(payment))
}
