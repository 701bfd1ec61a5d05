//! # Gateway Configuration
//!
//! Configuration for the YooKassa channel. All secrets are loaded from
//! environment variables, validated once at startup, and the resulting
//! struct is handed to components by value; credentials are never mutated
//! at runtime or shared as process globals.

use recon_core::{CaptureMode, Currency, GatewayError};
use std::env;

/// Validated per-channel gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shop (account) identifier, the public half of the credentials
    pub shop_id: String,

    /// Secret API key
    pub secret_api_key: String,

    /// Webhook signing secret
    pub webhook_secret: String,

    /// Whether to capture automatically on authorization
    pub capture_mode: CaptureMode,

    /// URL the customer returns to after redirect confirmation
    pub return_url: String,

    /// Currencies this channel accepts
    pub supported_currencies: Vec<Currency>,

    /// API base URL (overridable for tests)
    pub api_base_url: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `YOOKASSA_SHOP_ID`
    /// - `YOOKASSA_SECRET_KEY`
    /// - `YOOKASSA_WEBHOOK_SECRET`
    /// - `GATEWAY_RETURN_URL`
    ///
    /// Optional:
    /// - `GATEWAY_CAPTURE_MODE` (`automatic` | `manual`, default automatic)
    /// - `GATEWAY_CURRENCIES` (comma separated, default `RUB`)
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let shop_id = env::var("YOOKASSA_SHOP_ID")
            .map_err(|_| GatewayError::Configuration("YOOKASSA_SHOP_ID not set".to_string()))?;

        let secret_api_key = env::var("YOOKASSA_SECRET_KEY")
            .map_err(|_| GatewayError::Configuration("YOOKASSA_SECRET_KEY not set".to_string()))?;

        let webhook_secret = env::var("YOOKASSA_WEBHOOK_SECRET").map_err(|_| {
            GatewayError::Configuration("YOOKASSA_WEBHOOK_SECRET not set".to_string())
        })?;

        let return_url = env::var("GATEWAY_RETURN_URL")
            .map_err(|_| GatewayError::Configuration("GATEWAY_RETURN_URL not set".to_string()))?;

        let capture_mode = match env::var("GATEWAY_CAPTURE_MODE").as_deref() {
            Ok("manual") => CaptureMode::Manual,
            Ok("automatic") | Err(_) => CaptureMode::Automatic,
            Ok(other) => {
                return Err(GatewayError::Configuration(format!(
                    "GATEWAY_CAPTURE_MODE must be automatic or manual, got {}",
                    other
                )))
            }
        };

        let supported_currencies = match env::var("GATEWAY_CURRENCIES") {
            Ok(raw) => raw
                .split(',')
                .map(|code| {
                    code.trim()
                        .parse::<Currency>()
                        .map_err(GatewayError::Configuration)
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => vec![Currency::RUB],
        };

        Self::new(
            shop_id,
            secret_api_key,
            webhook_secret,
            return_url,
            capture_mode,
            supported_currencies,
        )
    }

    /// Create a validated config with explicit values
    pub fn new(
        shop_id: impl Into<String>,
        secret_api_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        return_url: impl Into<String>,
        capture_mode: CaptureMode,
        supported_currencies: Vec<Currency>,
    ) -> Result<Self, GatewayError> {
        let config = Self {
            shop_id: shop_id.into(),
            secret_api_key: secret_api_key.into(),
            webhook_secret: webhook_secret.into(),
            capture_mode,
            return_url: return_url.into(),
            supported_currencies,
            api_base_url: "https://api.yookassa.ru".to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.shop_id.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Shop id must not be empty".to_string(),
            ));
        }
        if self.secret_api_key.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Secret API key must not be empty".to_string(),
            ));
        }
        if self.webhook_secret.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Webhook secret must not be empty".to_string(),
            ));
        }
        if !self.return_url.starts_with("http://") && !self.return_url.starts_with("https://") {
            return Err(GatewayError::Configuration(format!(
                "Return URL must be absolute, got {}",
                self.return_url
            )));
        }
        if self.supported_currencies.is_empty() {
            return Err(GatewayError::Configuration(
                "At least one supported currency is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether this channel accepts a currency
    pub fn supports_currency(&self, currency: Currency) -> bool {
        self.supported_currencies.contains(&currency)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
