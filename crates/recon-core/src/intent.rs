//! # Payment Intent Types
//!
//! Typed view of the processor-side intent record and the request that
//! creates one. The intent has its own status lifecycle on the processor;
//! locally it is immutable except by whole-record replacement from
//! `fetch_intent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    RUB,
    USD,
    EUR,
    KZT,
    BYN,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::RUB => "RUB",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::KZT => "KZT",
            Currency::BYN => "BYN",
        }
    }

    /// All currencies this build knows how to express
    pub fn all() -> &'static [Currency] {
        &[
            Currency::RUB,
            Currency::USD,
            Currency::EUR,
            Currency::KZT,
            Currency::BYN,
        ]
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUB" => Ok(Currency::RUB),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "KZT" => Ok(Currency::KZT),
            "BYN" => Ok(Currency::BYN),
            other => Err(format!("Unknown currency code: {}", other)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether funds are captured automatically on authorization or require an
/// explicit follow-up capture call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Automatic,
    Manual,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Automatic => "automatic",
            CaptureMode::Manual => "manual",
        }
    }
}

impl Default for CaptureMode {
    fn default() -> Self {
        CaptureMode::Automatic
    }
}

/// A processor-side payment intent, as returned by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Opaque identifier assigned by the processor
    pub id: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Currency of the intent
    pub currency: Currency,

    /// Provider-reported status string (interpreted by the status mapper)
    pub status: String,

    /// Client confirmation token / redirect URL, when the intent needs
    /// customer interaction to proceed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,

    /// Customer identifier on the processor side, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Request to create an intent on the processor
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// Platform order identifier (drives the idempotency key)
    pub order_id: String,
    /// Amount in the smallest currency unit, must be positive
    pub amount: i64,
    /// Currency code
    pub currency: Currency,
    /// URL the customer returns to after redirect-based confirmation
    pub return_url: String,
    /// Human-readable order description forwarded to the processor
    pub description: Option<String>,
    /// Capture mode for this charge
    pub capture_mode: CaptureMode,
}

/// Result of interpreting a provider status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Customer interaction still required
    Pending,
    /// Funds are being settled by the processor
    Processing,
    /// Charge completed
    Success,
    /// Charge failed or was canceled
    Failed,
    /// Status string not recognized; callers must not advance state
    Unknown,
}

/// Disambiguates provider statuses whose meaning depends on whether a
/// capture has already been attempted (`requires_payment_method` reads as
/// "awaiting a method" before capture and as "failed" after).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    PreCapture,
    PostCapture,
}

/// Status mapping outcome: the transaction kind plus whether the customer
/// still has something to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMapping {
    pub kind: ResultKind,
    pub action_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_roundtrip() {
        for cur in Currency::all() {
            assert_eq!(cur.as_str().parse::<Currency>().unwrap(), *cur);
        }
        assert_eq!("rub".parse::<Currency>().unwrap(), Currency::RUB);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_capture_mode_strings() {
        assert_eq!(CaptureMode::Automatic.as_str(), "automatic");
        assert_eq!(CaptureMode::Manual.as_str(), "manual");
        assert_eq!(CaptureMode::default(), CaptureMode::Automatic);
    }
}
