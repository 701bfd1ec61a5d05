//! # YooKassa API Client
//!
//! `ProcessorClient` implementation over the YooKassa payments API.
//! Creates payment intents with deterministic idempotency keys and
//! classifies every failure mode into the gateway error taxonomy.

use crate::config::GatewayConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recon_core::{
    Currency, GatewayError, GatewayResult, IntentRequest, PaymentIntent, ProcessorClient,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Bounded timeout: a stalled processor call must surface as a retryable
/// network error instead of hanging the checkout flow.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// YooKassa payments API client
pub struct YookassaClient {
    config: GatewayConfig,
    client: Client,
}

impl YookassaClient {
    /// Create a new client for a configured channel
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> GatewayResult<Self> {
        let config = GatewayConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Deterministic idempotency key over (order, amount, currency) so a
    /// retried checkout submission reuses the upstream intent instead of
    /// creating a duplicate.
    fn idempotency_key(request: &IntentRequest) -> String {
        let material = format!(
            "{}:{}:{}",
            request.order_id, request.amount, request.currency
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, material.as_bytes()).to_string()
    }

    fn classify_api_error(status: StatusCode, body: &str) -> GatewayError {
        if let Ok(api_error) = serde_json::from_str::<YookassaErrorResponse>(body) {
            if api_error.code.as_deref() == Some("payment_declined") {
                return GatewayError::Declined {
                    reason: api_error.description,
                };
            }
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GatewayError::Configuration(api_error.description)
                }
                StatusCode::PAYMENT_REQUIRED => GatewayError::Declined {
                    reason: api_error.description,
                },
                StatusCode::BAD_REQUEST => GatewayError::InvalidRequest(api_error.description),
                StatusCode::TOO_MANY_REQUESTS => GatewayError::NetworkError(api_error.description),
                s if s.is_server_error() => GatewayError::NetworkError(api_error.description),
                _ => GatewayError::ProcessorError {
                    processor: "yookassa".to_string(),
                    message: api_error.description,
                },
            };
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GatewayError::Configuration(format!("HTTP {}: {}", status, body))
            }
            s if s.is_server_error() => {
                GatewayError::NetworkError(format!("HTTP {}: {}", status, body))
            }
            _ => GatewayError::ProcessorError {
                processor: "yookassa".to_string(),
                message: format!("HTTP {}: {}", status, body),
            },
        }
    }

    fn classify_transport_error(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::NetworkError("Request to processor timed out".to_string())
        } else {
            GatewayError::NetworkError(err.to_string())
        }
    }

    fn parse_intent(body: &str) -> GatewayResult<PaymentIntent> {
        let response: YookassaPaymentResponse = serde_json::from_str(body).map_err(|e| {
            GatewayError::Serialization(format!("Failed to parse processor response: {}", e))
        })?;

        let currency = response
            .amount
            .currency
            .parse::<Currency>()
            .map_err(GatewayError::Serialization)?;

        Ok(PaymentIntent {
            id: response.id,
            amount: decimal_to_minor_units(&response.amount.value)?,
            currency,
            status: response.status,
            confirmation_token: response.confirmation.and_then(|c| c.confirmation_url),
            customer_id: response.customer_id,
            created_at: response.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl ProcessorClient for YookassaClient {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_intent(&self, request: &IntentRequest) -> GatewayResult<PaymentIntent> {
        // Fail fast before touching the network
        if request.amount <= 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "Amount must be positive, got {}",
                request.amount
            )));
        }
        if !self.config.supports_currency(request.currency) {
            return Err(GatewayError::UnsupportedCurrency {
                currency: request.currency.to_string(),
            });
        }

        let payload = CreatePaymentPayload {
            amount: MoneyPayload {
                value: minor_units_to_decimal(request.amount),
                currency: request.currency.to_string(),
            },
            capture: request.capture_mode == recon_core::CaptureMode::Automatic,
            confirmation: ConfirmationPayload {
                kind: "redirect".to_string(),
                return_url: request.return_url.clone(),
            },
            description: request.description.clone(),
        };

        let idempotency_key = Self::idempotency_key(request);
        debug!(%idempotency_key, amount = request.amount, "Creating payment intent");

        let url = format!("{}/v3/payments", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_api_key))
            .header("Idempotence-Key", &idempotency_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(Self::classify_transport_error)?;

        if !status.is_success() {
            error!("Processor API error: status={}, body={}", status, body);
            return Err(Self::classify_api_error(status, &body));
        }

        let intent = Self::parse_intent(&body)?;
        info!(intent_id = %intent.id, status = %intent.status, "Created payment intent");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn fetch_intent(&self, intent_id: &str) -> GatewayResult<PaymentIntent> {
        let url = format!("{}/v3/payments/{}", self.config.api_base_url, intent_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_api_key))
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(Self::classify_transport_error)?;

        if !status.is_success() {
            error!("Processor API error: status={}, body={}", status, body);
            return Err(Self::classify_api_error(status, &body));
        }

        Self::parse_intent(&body)
    }

    fn processor_name(&self) -> &'static str {
        "yookassa"
    }
}

/// Render minor units as the processor's decimal string ("1000" -> "10.00")
fn minor_units_to_decimal(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

/// Parse the processor's decimal string back into minor units
pub(crate) fn decimal_to_minor_units(value: &str) -> GatewayResult<i64> {
    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, "0"),
    };

    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::Serialization(format!(
            "Bad amount value: {}",
            value
        )));
    }

    let whole: i64 = whole
        .parse()
        .map_err(|_| GatewayError::Serialization(format!("Bad amount value: {}", value)))?;
    let frac_padded = format!("{:0<2}", frac);
    let cents: i64 = frac_padded[..2]
        .parse()
        .map_err(|_| GatewayError::Serialization(format!("Bad amount value: {}", value)))?;

    whole
        .checked_mul(100)
        .and_then(|minor| minor.checked_add(cents))
        .ok_or_else(|| GatewayError::Serialization(format!("Amount out of range: {}", value)))
}

// =============================================================================
// Processor API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreatePaymentPayload {
    amount: MoneyPayload,
    capture: bool,
    confirmation: ConfirmationPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct MoneyPayload {
    value: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct ConfirmationPayload {
    #[serde(rename = "type")]
    kind: String,
    return_url: String,
}

#[derive(Debug, Deserialize)]
struct YookassaPaymentResponse {
    id: String,
    status: String,
    amount: MoneyResponse,
    #[serde(default)]
    confirmation: Option<ConfirmationResponse>,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MoneyResponse {
    value: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmationResponse {
    #[serde(default)]
    confirmation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YookassaErrorResponse {
    #[serde(default)]
    code: Option<String>,
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::CaptureMode;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> GatewayConfig {
        GatewayConfig::new(
            "shop_123",
            "test_secret",
            "whsec_test",
            "https://shop.example/return",
            CaptureMode::Automatic,
            vec![Currency::RUB],
        )
        .unwrap()
        .with_api_base_url(base_url)
    }

    fn request(amount: i64) -> IntentRequest {
        IntentRequest {
            order_id: "ord_1".to_string(),
            amount,
            currency: Currency::RUB,
            return_url: "https://shop.example/return".to_string(),
            description: Some("Order #1".to_string()),
            capture_mode: CaptureMode::Automatic,
        }
    }

    #[test]
    fn test_amount_conversions() {
        assert_eq!(minor_units_to_decimal(1000), "10.00");
        assert_eq!(minor_units_to_decimal(5), "0.05");
        assert_eq!(minor_units_to_decimal(123456), "1234.56");

        assert_eq!(decimal_to_minor_units("10.00").unwrap(), 1000);
        assert_eq!(decimal_to_minor_units("0.05").unwrap(), 5);
        assert_eq!(decimal_to_minor_units("10.5").unwrap(), 1050);
        assert_eq!(decimal_to_minor_units("10").unwrap(), 1000);
        assert!(decimal_to_minor_units("ten").is_err());
        // Values past i64 minor units are rejected, not wrapped
        assert!(decimal_to_minor_units("92233720368547758.08").is_err());
        assert!(decimal_to_minor_units(&format!("{}.00", i64::MAX)).is_err());
    }

    #[test]
    fn test_idempotency_key_is_deterministic() {
        let a = YookassaClient::idempotency_key(&request(1000));
        let b = YookassaClient::idempotency_key(&request(1000));
        assert_eq!(a, b);

        let c = YookassaClient::idempotency_key(&request(2000));
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_invalid_amount_fails_before_network() {
        // Unroutable base URL: a network call would error differently
        let client = YookassaClient::new(test_config("http://127.0.0.1:1"));
        let err = client.create_intent(&request(0)).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unsupported_currency_fails_fast() {
        let client = YookassaClient::new(test_config("http://127.0.0.1:1"));
        let mut req = request(1000);
        req.currency = Currency::EUR;
        let err = client.create_intent(&req).await.unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedCurrency { .. }));
    }

    #[tokio::test]
    async fn test_create_intent_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/payments"))
            .and(header_exists("Idempotence-Key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_abc",
                "status": "requires_confirmation",
                "amount": {"value": "10.00", "currency": "RUB"},
                "confirmation": {
                    "type": "redirect",
                    "confirmation_url": "https://pay.example/confirm/abc"
                }
            })))
            .mount(&server)
            .await;

        let client = YookassaClient::new(test_config(&server.uri()));
        let intent = client.create_intent(&request(1000)).await.unwrap();

        assert_eq!(intent.id, "pi_abc");
        assert_eq!(intent.amount, 1000);
        assert_eq!(intent.currency, Currency::RUB);
        assert_eq!(intent.status, "requires_confirmation");
        assert_eq!(
            intent.confirmation_token.as_deref(),
            Some("https://pay.example/confirm/abc")
        );
    }

    #[tokio::test]
    async fn test_auth_failure_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/payments"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "type": "error",
                "code": "invalid_credentials",
                "description": "Authentication failed"
            })))
            .mount(&server)
            .await;

        let client = YookassaClient::new(test_config(&server.uri()));
        let err = client.create_intent(&request(1000)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/payments"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = YookassaClient::new(test_config(&server.uri()));
        let err = client.create_intent(&request(1000)).await.unwrap_err();
        assert!(matches!(err, GatewayError::NetworkError(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_decline_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/payments"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "type": "error",
                "code": "payment_declined",
                "description": "Card declined by issuer"
            })))
            .mount(&server)
            .await;

        let client = YookassaClient::new(test_config(&server.uri()));
        let err = client.create_intent(&request(1000)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Declined { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_intent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/payments/pi_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_abc",
                "status": "succeeded",
                "amount": {"value": "10.00", "currency": "RUB"}
            })))
            .mount(&server)
            .await;

        let client = YookassaClient::new(test_config(&server.uri()));
        let intent = client.fetch_intent("pi_abc").await.unwrap();
        assert_eq!(intent.status, "succeeded");
    }
}
